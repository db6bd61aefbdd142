// This file is part of swiss-pairing.
//
// swiss-pairing is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// swiss-pairing is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Maximum weight matching in a general graph.
//!
//! Edmonds' blossom algorithm with dual variables, `O(n³)`. Of all the
//! matchings with the most edges, [`max_weight_matching`] returns one of the
//! greatest total weight.
//!
//! Edges are numbered `k`, and each edge has two endpoints `2k` and `2k + 1`.
//! `endpoint[p]` is the vertex at endpoint `p`, so `p ^ 1` is the other end of
//! the same edge. Blossoms are numbered after the vertices.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Label {
    Free,
    /// An S vertex or blossom, an even distance from a free vertex.
    Outer,
    /// A T vertex or blossom, an odd distance from a free vertex.
    Inner,
}

/// How the duals changed when no tight edge was left to follow.
#[derive(Clone, Copy, Debug)]
enum Delta {
    /// An edge from an S vertex to a free vertex became tight.
    Grow(usize),
    /// An edge between two S blossoms became tight.
    Merge(usize),
    /// A T blossom's dual reached zero.
    Expand(usize),
    Done,
}

/// Returns the mate of every vertex in `0..vertices`.
///
/// Edges are `(a, b, weight)`. Loops and edges naming a vertex out of range
/// are ignored.
#[must_use]
pub fn max_weight_matching(vertices: usize, edges: &[(usize, usize, i64)]) -> Vec<Option<usize>> {
    let edges: Vec<(usize, usize, i64)> = edges
        .iter()
        .copied()
        .filter(|&(a, b, _)| a != b && a < vertices && b < vertices)
        .collect();

    if edges.is_empty() {
        return vec![None; vertices];
    }

    // Every matching compared has the same number of edges, so a common
    // offset keeps the order and leaves all weights positive.
    let lightest = edges.iter().map(|&(_, _, weight)| weight).min().unwrap_or(1);
    let offset = if lightest < 1 { 1 - lightest } else { 0 };
    let edges: Vec<(usize, usize, i64)> = edges
        .into_iter()
        .map(|(a, b, weight)| (a, b, weight + offset))
        .collect();

    let mut matching = Matching::new(vertices, &edges);
    matching.solve();
    matching.mates()
}

struct Matching<'a> {
    vertices: usize,
    edges: &'a [(usize, usize, i64)],
    endpoint: Vec<usize>,
    /// The endpoints leading away from each vertex.
    neighbours: Vec<Vec<usize>>,
    /// The endpoint of each vertex's mate.
    mate: Vec<Option<usize>>,
    label: Vec<Label>,
    /// The endpoint through which a vertex or blossom got its label.
    label_end: Vec<Option<usize>>,
    /// The outermost blossom holding each vertex.
    in_blossom: Vec<usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    base: Vec<Option<usize>>,
    /// `ends[b][i]` joins `children[b][i]` to `children[b][i + 1]`.
    ends: Vec<Vec<usize>>,
    best_edge: Vec<Option<usize>>,
    best_edges: Vec<Option<Vec<usize>>>,
    unused: Vec<usize>,
    dual: Vec<i64>,
    allowed: Vec<bool>,
    marked: Vec<bool>,
    queue: Vec<usize>,
}

impl<'a> Matching<'a> {
    fn new(vertices: usize, edges: &'a [(usize, usize, i64)]) -> Self {
        let heaviest = edges
            .iter()
            .map(|&(_, _, weight)| weight)
            .max()
            .unwrap_or(0)
            .max(0);

        let mut endpoint = Vec::with_capacity(2 * edges.len());
        let mut neighbours = vec![Vec::new(); vertices];
        for (k, &(a, b, _)) in edges.iter().enumerate() {
            endpoint.push(a);
            endpoint.push(b);
            neighbours[a].push(2 * k + 1);
            neighbours[b].push(2 * k);
        }

        let mut dual = vec![heaviest; vertices];
        dual.resize(2 * vertices, 0);

        Self {
            vertices,
            edges,
            endpoint,
            neighbours,
            mate: vec![None; vertices],
            label: vec![Label::Free; 2 * vertices],
            label_end: vec![None; 2 * vertices],
            in_blossom: (0..vertices).collect(),
            parent: vec![None; 2 * vertices],
            children: vec![Vec::new(); 2 * vertices],
            base: (0..vertices)
                .map(Some)
                .chain(std::iter::repeat_n(None, vertices))
                .collect(),
            ends: vec![Vec::new(); 2 * vertices],
            best_edge: vec![None; 2 * vertices],
            best_edges: vec![None; 2 * vertices],
            unused: (vertices..2 * vertices).collect(),
            dual,
            allowed: vec![false; edges.len()],
            marked: vec![false; 2 * vertices],
            queue: Vec::new(),
        }
    }

    fn mates(&self) -> Vec<Option<usize>> {
        self.mate
            .iter()
            .map(|mate| mate.map(|p| self.endpoint[p]))
            .collect()
    }

    fn slack(&self, k: usize) -> i64 {
        let (a, b, weight) = self.edges[k];
        self.dual[a] + self.dual[b] - 2 * weight
    }

    fn leaves(&self, blossom: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![blossom];

        while let Some(blossom) = stack.pop() {
            if blossom < self.vertices {
                leaves.push(blossom);
            } else {
                stack.extend(self.children[blossom].iter().rev());
            }
        }

        leaves
    }

    /// The next child index going around a blossom of `len` children.
    fn step(j: usize, len: usize, forward: bool) -> usize {
        if forward {
            (j + 1) % len
        } else {
            (j + len - 1) % len
        }
    }

    fn assign_label(&mut self, vertex: usize, label: Label, end: Option<usize>) {
        let blossom = self.in_blossom[vertex];
        self.label[vertex] = label;
        self.label[blossom] = label;
        self.label_end[vertex] = end;
        self.label_end[blossom] = end;
        self.best_edge[vertex] = None;
        self.best_edge[blossom] = None;

        match label {
            Label::Outer => {
                let leaves = self.leaves(blossom);
                self.queue.extend(leaves);
            }
            Label::Inner => {
                // The base of a T blossom is always matched.
                if let Some(base) = self.base[blossom]
                    && let Some(mate) = self.mate[base]
                {
                    let vertex = self.endpoint[mate];
                    self.assign_label(vertex, Label::Outer, Some(mate ^ 1));
                }
            }
            Label::Free => {}
        }
    }

    /// Walks up from two S vertices. Returns the base of a new blossom, or
    /// `None` if the walks reach two different roots.
    fn scan_blossom(&mut self, v: usize, w: usize) -> Option<usize> {
        let mut path = Vec::new();
        let mut base = None;
        let mut v = Some(v);
        let mut w = Some(w);

        while let Some(vertex) = v {
            let blossom = self.in_blossom[vertex];
            if self.marked[blossom] {
                base = self.base[blossom];
                break;
            }

            path.push(blossom);
            self.marked[blossom] = true;

            v = self.label_end[blossom].and_then(|end| {
                let inner = self.in_blossom[self.endpoint[end]];
                self.label_end[inner].map(|end| self.endpoint[end])
            });

            if w.is_some() {
                std::mem::swap(&mut v, &mut w);
            }
        }

        for blossom in path {
            self.marked[blossom] = false;
        }

        base
    }

    fn add_blossom(&mut self, base: usize, edge: usize) {
        let (a, b, _) = self.edges[edge];
        let base_blossom = self.in_blossom[base];
        let mut left = self.in_blossom[a];
        let mut right = self.in_blossom[b];
        let Some(blossom) = self.unused.pop() else {
            return;
        };

        self.base[blossom] = Some(base);
        self.parent[blossom] = None;
        self.parent[base_blossom] = Some(blossom);

        let mut children = Vec::new();
        let mut ends = Vec::new();

        while left != base_blossom {
            self.parent[left] = Some(blossom);
            children.push(left);
            let Some(p) = self.label_end[left] else {
                break;
            };
            ends.push(p);
            left = self.in_blossom[self.endpoint[p]];
        }

        children.push(base_blossom);
        children.reverse();
        ends.reverse();
        ends.push(2 * edge);

        while right != base_blossom {
            self.parent[right] = Some(blossom);
            children.push(right);
            let Some(p) = self.label_end[right] else {
                break;
            };
            ends.push(p ^ 1);
            right = self.in_blossom[self.endpoint[p]];
        }

        self.children[blossom] = children.clone();
        self.ends[blossom] = ends;
        self.label[blossom] = Label::Outer;
        self.label_end[blossom] = self.label_end[base_blossom];
        self.dual[blossom] = 0;

        for leaf in self.leaves(blossom) {
            // T vertices become S vertices inside an S blossom.
            if self.label[self.in_blossom[leaf]] == Label::Inner {
                self.queue.push(leaf);
            }
            self.in_blossom[leaf] = blossom;
        }

        let mut best_to: Vec<Option<usize>> = vec![None; 2 * self.vertices];
        for child in children {
            let lists: Vec<Vec<usize>> = match self.best_edges[child].take() {
                Some(list) => vec![list],
                None => self
                    .leaves(child)
                    .into_iter()
                    .map(|leaf| self.neighbours[leaf].iter().map(|p| p / 2).collect())
                    .collect(),
            };

            for edge in lists.into_iter().flatten() {
                let (a, b, _) = self.edges[edge];
                let other = if self.in_blossom[b] == blossom { a } else { b };
                let other = self.in_blossom[other];

                if other != blossom
                    && self.label[other] == Label::Outer
                    && best_to[other].is_none_or(|best| self.slack(edge) < self.slack(best))
                {
                    best_to[other] = Some(edge);
                }
            }

            self.best_edge[child] = None;
        }

        let best: Vec<usize> = best_to.into_iter().flatten().collect();
        self.best_edge[blossom] = best.iter().copied().min_by_key(|&edge| self.slack(edge));
        self.best_edges[blossom] = Some(best);
    }

    fn expand_blossom(&mut self, blossom: usize, end_stage: bool) {
        let children = self.children[blossom].clone();

        for &child in &children {
            self.parent[child] = None;
            if child < self.vertices {
                self.in_blossom[child] = child;
            } else if end_stage && self.dual[child] == 0 {
                self.expand_blossom(child, end_stage);
            } else {
                for leaf in self.leaves(child) {
                    self.in_blossom[leaf] = child;
                }
            }
        }

        // A T blossom expanded mid stage keeps the alternating path through
        // it labelled.
        if !end_stage
            && self.label[blossom] == Label::Inner
            && let Some(entry_end) = self.label_end[blossom]
        {
            let len = children.len();
            let ends = self.ends[blossom].clone();
            let entry = self.in_blossom[self.endpoint[entry_end ^ 1]];
            let mut j = children
                .iter()
                .position(|&child| child == entry)
                .unwrap_or(0);
            let (forward, trick) = if j % 2 == 1 { (true, 0) } else { (false, 1) };
            let end_at = |j: usize| ends[(j + len - trick) % len];
            let mut p = entry_end;

            while j != 0 {
                let vertex = self.endpoint[p ^ 1];
                self.label[vertex] = Label::Free;
                self.label[self.endpoint[end_at(j) ^ trick ^ 1]] = Label::Free;
                self.assign_label(vertex, Label::Inner, Some(p));
                self.allowed[end_at(j) / 2] = true;
                j = Self::step(j, len, forward);
                p = end_at(j) ^ trick;
                self.allowed[p / 2] = true;
                j = Self::step(j, len, forward);
            }

            let child = children[j];
            let vertex = self.endpoint[p ^ 1];
            self.label[vertex] = Label::Inner;
            self.label[child] = Label::Inner;
            self.label_end[vertex] = Some(p);
            self.label_end[child] = Some(p);
            self.best_edge[child] = None;
            j = Self::step(j, len, forward);

            while children[j] != entry {
                let child = children[j];
                j = Self::step(j, len, forward);
                if self.label[child] == Label::Outer {
                    continue;
                }

                // A child reached from outside the blossom keeps its label.
                if let Some(leaf) = self
                    .leaves(child)
                    .into_iter()
                    .find(|&leaf| self.label[leaf] != Label::Free)
                {
                    self.label[leaf] = Label::Free;
                    if let Some(base) = self.base[child]
                        && let Some(mate) = self.mate[base]
                    {
                        self.label[self.endpoint[mate]] = Label::Free;
                    }
                    let end = self.label_end[leaf];
                    self.assign_label(leaf, Label::Inner, end);
                }
            }
        }

        self.label[blossom] = Label::Free;
        self.label_end[blossom] = None;
        self.children[blossom].clear();
        self.ends[blossom].clear();
        self.base[blossom] = None;
        self.best_edges[blossom] = None;
        self.best_edge[blossom] = None;
        self.unused.push(blossom);
    }

    /// Swaps matched and unmatched edges inside `blossom` so that `vertex`
    /// becomes its base.
    fn augment_blossom(&mut self, blossom: usize, vertex: usize) {
        let mut top = vertex;
        while let Some(up) = self.parent[top]
            && up != blossom
        {
            top = up;
        }
        if top >= self.vertices {
            self.augment_blossom(top, vertex);
        }

        let children = self.children[blossom].clone();
        let ends = self.ends[blossom].clone();
        let len = children.len();
        let Some(start) = children.iter().position(|&child| child == top) else {
            return;
        };
        let (forward, trick) = if start % 2 == 1 { (true, 0) } else { (false, 1) };
        let mut j = start;

        while j != 0 {
            j = Self::step(j, len, forward);
            let child = children[j];
            let p = ends[(j + len - trick) % len] ^ trick;
            if child >= self.vertices {
                let vertex = self.endpoint[p];
                self.augment_blossom(child, vertex);
            }

            j = Self::step(j, len, forward);
            let child = children[j];
            if child >= self.vertices {
                let vertex = self.endpoint[p ^ 1];
                self.augment_blossom(child, vertex);
            }

            let (a, b) = (self.endpoint[p], self.endpoint[p ^ 1]);
            self.mate[a] = Some(p ^ 1);
            self.mate[b] = Some(p);
        }

        self.children[blossom].rotate_left(start);
        self.ends[blossom].rotate_left(start);
        if let Some(&first) = self.children[blossom].first() {
            self.base[blossom] = self.base[first];
        }
    }

    /// Flips the two alternating paths joined by `edge`.
    fn augment_matching(&mut self, edge: usize) {
        let (a, b, _) = self.edges[edge];

        for (start, start_end) in [(a, 2 * edge + 1), (b, 2 * edge)] {
            let mut vertex = start;
            let mut end = start_end;

            loop {
                let outer = self.in_blossom[vertex];
                if outer >= self.vertices {
                    self.augment_blossom(outer, vertex);
                }
                self.mate[vertex] = Some(end);

                let Some(outer_end) = self.label_end[outer] else {
                    break;
                };
                let inner = self.in_blossom[self.endpoint[outer_end]];
                let Some(inner_end) = self.label_end[inner] else {
                    break;
                };

                vertex = self.endpoint[inner_end];
                let base = self.endpoint[inner_end ^ 1];
                if inner >= self.vertices {
                    self.augment_blossom(inner, base);
                }
                self.mate[base] = Some(inner_end);
                end = inner_end ^ 1;
            }
        }
    }

    /// Scans the queue of S vertices. Returns true once the matching grew.
    fn scan(&mut self) -> bool {
        while let Some(vertex) = self.queue.pop() {
            for end in self.neighbours[vertex].clone() {
                let edge = end / 2;
                let neighbour = self.endpoint[end];
                if self.in_blossom[vertex] == self.in_blossom[neighbour] {
                    continue;
                }

                let mut slack = 0;
                if !self.allowed[edge] {
                    slack = self.slack(edge);
                    if slack <= 0 {
                        self.allowed[edge] = true;
                    }
                }

                if self.allowed[edge] {
                    match self.label[self.in_blossom[neighbour]] {
                        Label::Free => self.assign_label(neighbour, Label::Inner, Some(end ^ 1)),
                        Label::Outer => match self.scan_blossom(vertex, neighbour) {
                            Some(base) => self.add_blossom(base, edge),
                            None => {
                                self.augment_matching(edge);
                                return true;
                            }
                        },
                        Label::Inner => {
                            // Remember how a vertex inside a T blossom was reached.
                            if self.label[neighbour] == Label::Free {
                                self.label[neighbour] = Label::Inner;
                                self.label_end[neighbour] = Some(end ^ 1);
                            }
                        }
                    }
                } else if self.label[self.in_blossom[neighbour]] == Label::Outer {
                    let blossom = self.in_blossom[vertex];
                    if self.best_edge[blossom].is_none_or(|best| slack < self.slack(best)) {
                        self.best_edge[blossom] = Some(edge);
                    }
                } else if self.label[neighbour] == Label::Free
                    && self.best_edge[neighbour].is_none_or(|best| slack < self.slack(best))
                {
                    self.best_edge[neighbour] = Some(edge);
                }
            }
        }

        false
    }

    fn delta(&self) -> (i64, Delta) {
        let mut delta: Option<(i64, Delta)> = None;
        let smaller = |delta: Option<(i64, Delta)>, slack: i64| {
            delta.is_none_or(|(best, _)| slack < best)
        };

        for vertex in 0..self.vertices {
            if self.label[self.in_blossom[vertex]] == Label::Free
                && let Some(edge) = self.best_edge[vertex]
            {
                let slack = self.slack(edge);
                if smaller(delta, slack) {
                    delta = Some((slack, Delta::Grow(edge)));
                }
            }
        }

        for blossom in 0..2 * self.vertices {
            if self.parent[blossom].is_none()
                && self.label[blossom] == Label::Outer
                && let Some(edge) = self.best_edge[blossom]
            {
                // Integer weights keep the slack between S vertices even.
                let slack = self.slack(edge) / 2;
                if smaller(delta, slack) {
                    delta = Some((slack, Delta::Merge(edge)));
                }
            }
        }

        for blossom in self.vertices..2 * self.vertices {
            if self.base[blossom].is_some()
                && self.parent[blossom].is_none()
                && self.label[blossom] == Label::Inner
                && smaller(delta, self.dual[blossom])
            {
                delta = Some((self.dual[blossom], Delta::Expand(blossom)));
            }
        }

        delta.unwrap_or_else(|| {
            let lowest = self.dual[..self.vertices].iter().copied().min().unwrap_or(0);
            (lowest.max(0), Delta::Done)
        })
    }

    fn solve(&mut self) {
        let vertices = self.vertices;

        for _ in 0..vertices {
            self.label.fill(Label::Free);
            self.best_edge.fill(None);
            self.best_edges[vertices..].fill(None);
            self.allowed.fill(false);
            self.queue.clear();

            for vertex in 0..vertices {
                if self.mate[vertex].is_none()
                    && self.label[self.in_blossom[vertex]] == Label::Free
                {
                    self.assign_label(vertex, Label::Outer, None);
                }
            }

            let mut augmented = false;
            loop {
                if self.scan() {
                    augmented = true;
                    break;
                }

                let (delta, kind) = self.delta();

                let labels: Vec<Label> = self
                    .in_blossom
                    .iter()
                    .map(|&blossom| self.label[blossom])
                    .collect();
                for (dual, label) in self.dual.iter_mut().zip(labels) {
                    match label {
                        Label::Outer => *dual -= delta,
                        Label::Inner => *dual += delta,
                        Label::Free => {}
                    }
                }
                for blossom in vertices..2 * vertices {
                    if self.base[blossom].is_some() && self.parent[blossom].is_none() {
                        match self.label[blossom] {
                            Label::Outer => self.dual[blossom] += delta,
                            Label::Inner => self.dual[blossom] -= delta,
                            Label::Free => {}
                        }
                    }
                }

                match kind {
                    Delta::Grow(edge) => {
                        self.allowed[edge] = true;
                        let (a, b, _) = self.edges[edge];
                        let outer = if self.label[self.in_blossom[a]] == Label::Free {
                            b
                        } else {
                            a
                        };
                        self.queue.push(outer);
                    }
                    Delta::Merge(edge) => {
                        self.allowed[edge] = true;
                        let (a, _, _) = self.edges[edge];
                        self.queue.push(a);
                    }
                    Delta::Expand(blossom) => self.expand_blossom(blossom, false),
                    Delta::Done => break,
                }
            }

            if !augmented {
                break;
            }

            for blossom in vertices..2 * vertices {
                if self.parent[blossom].is_none()
                    && self.base[blossom].is_some()
                    && self.label[blossom] == Label::Outer
                    && self.dual[blossom] == 0
                {
                    self.expand_blossom(blossom, true);
                }
            }
        }
    }
}
