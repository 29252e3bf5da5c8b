use crate::tree::LeafKey;

/// A network identity. Allocated identities are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetId(pub u32);

/// Disjoint-set forest of network identities. Each canonical identity keeps
/// the list of leaves holding it, so merging two networks moves one holder
/// list onto the other instead of revisiting geometry.
#[derive(Debug)]
pub struct NetworkIds {
    parent: Vec<u32>,
    holders: Vec<Vec<LeafKey>>,
}

impl Default for NetworkIds {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkIds {
    pub fn new() -> Self {
        // slot 0 is never handed out
        Self {
            parent: vec![0],
            holders: vec![Vec::new()],
        }
    }

    /// The next unused positive identity.
    pub fn allocate(&mut self) -> NetId {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        self.holders.push(Vec::new());
        NetId(id)
    }

    /// Canonical identity of `id`, compressing the path behind it.
    pub fn find(&mut self, id: NetId) -> NetId {
        let mut root = id.0;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        let mut cur = id.0;
        while self.parent[cur as usize] != root {
            let next = self.parent[cur as usize];
            self.parent[cur as usize] = root;
            cur = next;
        }
        NetId(root)
    }

    /// Canonical identity without mutating the forest.
    pub fn canonical(&self, id: NetId) -> NetId {
        let mut root = id.0;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        NetId(root)
    }

    /// Record that `leaf` now holds `id`.
    pub fn assign(&mut self, id: NetId, leaf: LeafKey) {
        let root = self.find(id);
        self.holders[root.0 as usize].push(leaf);
    }

    /// True if the two identities already resolve to the same network.
    pub fn same(&mut self, a: NetId, b: NetId) -> bool {
        self.find(a) == self.find(b)
    }

    /// Join two networks. The larger holder list absorbs the smaller one.
    pub fn merge(&mut self, a: NetId, b: NetId) -> NetId {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return ra;
        }
        let (keep, absorb) = if self.holders[ra.0 as usize].len() >= self.holders[rb.0 as usize].len() {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[absorb.0 as usize] = keep.0;
        let moved = std::mem::take(&mut self.holders[absorb.0 as usize]);
        self.holders[keep.0 as usize].extend(moved);
        keep
    }

    pub fn holders(&self, id: NetId) -> &[LeafKey] {
        &self.holders[self.canonical(id).0 as usize]
    }

    /// Canonical identities that hold at least one leaf, with their holders.
    pub fn networks(&self) -> impl Iterator<Item = (NetId, &[LeafKey])> + '_ {
        self.holders
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, h)| !h.is_empty())
            .map(|(id, h)| (NetId(id as u32), h.as_slice()))
    }

    /// Number of identities ever allocated.
    pub fn allocated(&self) -> usize {
        self.parent.len() - 1
    }
}
