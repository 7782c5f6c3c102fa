//! Edge topology: closedness and connected shells.

use crate::mesh::IndexedMesh;
use hashbrown::HashMap;
use nalgebra::Point3;

/// Whether the mesh is a closed, consistently oriented surface.
///
/// Every directed edge `(a, b)` must appear in exactly one face and its
/// reverse `(b, a)` in exactly one other. A mesh without faces, or with a
/// face that repeats a vertex, is not closed.
///
/// # Example
///
/// ```
/// use mesh_collision::topology::is_closed;
/// use mesh_collision::unit_cube;
///
/// let mut cube = unit_cube();
/// assert!(is_closed(&cube));
///
/// cube.faces.pop();
/// assert!(!is_closed(&cube));
/// ```
#[must_use]
pub fn is_closed(mesh: &IndexedMesh) -> bool {
    if mesh.faces.is_empty() {
        return false;
    }

    let mut directed: HashMap<(u32, u32), u32> = HashMap::with_capacity(mesh.faces.len() * 3);
    for &[a, b, c] in &mesh.faces {
        if a == b || b == c || c == a {
            return false;
        }
        for edge in [(a, b), (b, c), (c, a)] {
            let count = directed.entry(edge).or_insert(0);
            *count += 1;
            if *count > 1 {
                return false;
            }
        }
    }

    directed
        .keys()
        .all(|&(a, b)| directed.contains_key(&(b, a)))
}

/// One representative point per connected shell.
///
/// Faces belong to the same shell when they share an undirected edge.
/// Shells are ordered by their lowest face index and represented by that
/// face's first vertex. A mesh without faces yields its first vertex.
#[must_use]
pub fn shell_representatives(mesh: &IndexedMesh) -> Vec<Point3<f64>> {
    if mesh.faces.is_empty() {
        return mesh.vertices.first().map(|v| v.position).into_iter().collect();
    }

    let mut shells = face_shells(mesh);
    let mut seen = vec![false; mesh.faces.len()];
    let mut reps = Vec::new();
    for face in 0..mesh.faces.len() {
        let root = shells.find(face);
        if !seen[root] {
            seen[root] = true;
            reps.push(mesh.position(mesh.faces[face][0]));
        }
    }
    reps
}

/// Number of connected shells (0 for a mesh without faces).
#[must_use]
pub fn shell_count(mesh: &IndexedMesh) -> usize {
    let mut shells = face_shells(mesh);
    (0..mesh.faces.len())
        .filter(|&face| shells.find(face) == face)
        .count()
}

fn face_shells(mesh: &IndexedMesh) -> UnionFind {
    let mut shells = UnionFind::new(mesh.faces.len());
    let mut first_face: HashMap<(u32, u32), usize> = HashMap::with_capacity(mesh.faces.len() * 3);

    for (face_idx, &[a, b, c]) in mesh.faces.iter().enumerate() {
        for edge in [normalize_edge(a, b), normalize_edge(b, c), normalize_edge(c, a)] {
            match first_face.get(&edge) {
                Some(&other) => shells.union(face_idx, other),
                None => {
                    first_face.insert(edge, face_idx);
                }
            }
        }
    }
    shells
}

#[inline]
fn normalize_edge(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

/// Disjoint sets with path compression and union by rank.
#[derive(Debug)]
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] = self.rank[ra].saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::mesh::{Vertex, cuboid, unit_cube};
    use nalgebra::Vector3;

    fn two_cubes() -> IndexedMesh {
        let mut mesh = unit_cube();
        mesh.merge(&cuboid(Point3::new(10.0, 0.0, 0.0), Vector3::new(0.5, 0.5, 0.5)));
        mesh
    }

    #[test]
    fn cube_is_closed() {
        assert!(is_closed(&unit_cube()));
        assert!(is_closed(&two_cubes()));
    }

    #[test]
    fn open_and_faceless_meshes_are_not_closed() {
        let mut open = unit_cube();
        open.faces.truncate(10);
        assert!(!is_closed(&open));

        let mut points = IndexedMesh::new();
        points.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        assert!(!is_closed(&points));
    }

    #[test]
    fn flipped_face_is_not_closed() {
        let mut mesh = unit_cube();
        let [a, b, c] = mesh.faces[0];
        mesh.faces[0] = [a, c, b];
        assert!(!is_closed(&mesh));
    }

    #[test]
    fn degenerate_face_is_not_closed() {
        let mut mesh = unit_cube();
        mesh.faces.push([0, 0, 1]);
        assert!(!is_closed(&mesh));
    }

    #[test]
    fn duplicated_face_is_not_closed() {
        let mut mesh = unit_cube();
        let first = mesh.faces[0];
        mesh.faces.push(first);
        assert!(!is_closed(&mesh));
    }

    #[test]
    fn one_shell_per_component() {
        assert_eq!(shell_count(&unit_cube()), 1);
        assert_eq!(shell_representatives(&unit_cube()).len(), 1);

        let mesh = two_cubes();
        assert_eq!(shell_count(&mesh), 2);
        let reps = shell_representatives(&mesh);
        assert_eq!(reps.len(), 2);
        assert!(reps[0].x < 5.0);
        assert!(reps[1].x > 5.0);
    }

    #[test]
    fn faces_sharing_only_a_vertex_are_separate_shells() {
        let mesh = IndexedMesh::from_raw(
            &[
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, -1.0, 0.0,
            ],
            &[0, 1, 2, 0, 3, 4],
        );
        assert_eq!(shell_count(&mesh), 2);
    }

    #[test]
    fn faceless_mesh_uses_first_vertex() {
        let mut mesh = IndexedMesh::new();
        mesh.vertices.push(Vertex::from_coords(3.0, 2.0, 1.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        assert_eq!(shell_representatives(&mesh), vec![Point3::new(3.0, 2.0, 1.0)]);
        assert_eq!(shell_count(&mesh), 0);
    }
}
