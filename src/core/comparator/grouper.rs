//! Groups batch members into clusters using transitive relationships.
//!
//! If A matches B and B matches C, then {A, B, C} forms a single group
//! even if A doesn't directly match C. Images with no match form
//! singleton groups.

/// Union-find over batch indices
#[derive(Debug, Clone)]
pub struct TransitiveGrouper {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl TransitiveGrouper {
    /// Create a grouper with every index in its own set
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    /// Number of indices tracked
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Find root with path compression
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut current = x;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }

        root
    }

    /// Union two sets
    pub fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }

        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] += 1;
            }
        }
    }

    /// Partition every index into groups.
    ///
    /// Members are ascending; groups are ordered by their smallest member.
    pub fn groups(&mut self) -> Vec<Vec<usize>> {
        let mut slot_of_root: Vec<Option<usize>> = vec![None; self.len()];
        let mut groups: Vec<Vec<usize>> = Vec::new();

        // Visiting indices in order keeps both orderings without sorting
        for index in 0..self.len() {
            let root = self.find(index);
            match slot_of_root[root] {
                Some(slot) => groups[slot].push(index),
                None => {
                    slot_of_root[root] = Some(groups.len());
                    groups.push(vec![index]);
                }
            }
        }

        groups
    }
}
