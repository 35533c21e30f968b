use arrayvec::ArrayVec;
use log::debug;

use crate::aabb::Aabb;
use crate::shapes::{ Hit, Primitive };
use crate::types::Ray;

// Subdivision stops at this depth, so the traversal stack is bounded too.
const MAX_BUILD_DEPTH: u32 = 40;

// Stack capacity: one pending sibling per level of the tree, plus slack.
const TRAVERSAL_STACK: usize = 64;

// Keeps secondary rays from re-hitting the surface they start on.
const TRAVERSAL_T_MIN: f64 = 0.001;

struct BvhNode {
    aabb: Aabb,
    data: BvhNodeData,
}

enum BvhNodeData {
    // Indices of the children in the node array
    Branch { left: usize, right: usize },
    // Range [first, first + count) in the prim_indices array
    Leaf { first: usize, count: usize },
}

/// Bounding volume hierarchy over a scene's primitives.
///
/// Nodes live in one flat array addressed by index; leaves reference ranges
/// of `prim_indices`, which is a permutation of the scene's object indices.
/// Algorithm adapted from https://jacco.ompf2.com/2022/04/13/how-to-build-a-bvh-part-1-basics/
pub struct Bvh {
    nodes: Vec<BvhNode>,
    prim_indices: Vec<usize>,
}

impl Bvh {
    pub fn build(objects: &[Primitive]) -> Bvh {
        let mut prim_indices = (0..objects.len()).collect::<Vec<usize>>();
        let mut nodes = Vec::with_capacity(objects.len() * 2);

        if !objects.is_empty() {
            let len = prim_indices.len();
            subdivide(&mut nodes, &mut prim_indices, objects, 0, len, 0);
        }

        debug!("built {}-node tree over {} primitives", nodes.len(), objects.len());

        Bvh { nodes, prim_indices }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Closest-hit query. On a miss the caller's `hit.t` cursor is restored
    /// to its value at entry.
    pub fn intersect(&self, ray: &Ray, objects: &[Primitive], hit: &mut Hit) -> bool {
        if self.nodes.is_empty() {
            return false;
        }

        let original_t = hit.t;
        let mut found = false;

        // Depth-first, left child first: siblings wait on the stack and are
        // re-tested against the shrunken [t_min, hit.t] interval when popped.
        let mut stack = ArrayVec::<usize, TRAVERSAL_STACK>::new();
        stack.push(0);
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];
            if !node.aabb.hit_aabb(ray, TRAVERSAL_T_MIN, hit.t) {
                continue;
            }
            match node.data {
                BvhNodeData::Leaf { first, count } => {
                    for i in first..(first + count) {
                        if objects[self.prim_indices[i]].intersect(ray, hit) {
                            found = true;
                        }
                    }
                }
                BvhNodeData::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }

        if !found {
            hit.t = original_t;
        }
        found
    }
}

fn range_bounds(prim_indices: &[usize], objects: &[Primitive], start: usize, end: usize) -> Aabb {
    let mut aabb = Aabb::default();
    for &obj_index in &prim_indices[start..end] {
        aabb.expand(&objects[obj_index].bounds());
    }
    aabb
}

fn axis_value(aabb: &Aabb, axis: usize) -> f64 {
    aabb.center().xyz()[axis]
}

/// Builds the node for `prim_indices[start..end]`, recursing top-down.
/// Returns the new node's index.
fn subdivide(
    nodes: &mut Vec<BvhNode>,
    prim_indices: &mut [usize],
    objects: &[Primitive],
    start: usize,
    end: usize,
    depth: u32,
) -> usize {
    let aabb = range_bounds(prim_indices, objects, start, end);
    let count = end - start;

    let node_index = nodes.len();
    nodes.push(BvhNode {
        aabb,
        data: BvhNodeData::Leaf { first: start, count },
    });

    if count <= 2 || depth > MAX_BUILD_DEPTH {
        return node_index;
    }

    // Split the dominant extent axis at its midpoint
    let extent = (aabb.max - aabb.min).xyz();
    let mut axis = 0;
    if extent[1] > extent[0] {
        axis = 1;
    }
    if extent[2] > extent[0] && extent[2] > extent[1] {
        axis = 2;
    }
    let split_pos = aabb.min.xyz()[axis] + extent[axis] * 0.5;

    // Partition in place: centroids left of the split go to the front
    let mut mid = start;
    for i in start..end {
        if axis_value(&objects[prim_indices[i]].bounds(), axis) < split_pos {
            prim_indices.swap(i, mid);
            mid += 1;
        }
    }

    // Midpoint splits of clumped primitives can put everything on one side;
    // fall back to a median split, and failing that stay a leaf.
    if mid == start || mid == end {
        mid = start + count / 2;
        if mid == start || mid == end {
            return node_index;
        }
    }

    let left = subdivide(nodes, prim_indices, objects, start, mid, depth + 1);
    let right = subdivide(nodes, prim_indices, objects, mid, end, depth + 1);
    nodes[node_index].data = BvhNodeData::Branch { left, right };

    node_index
}

#[cfg(test)]
mod test {
    use rand::{ Rng, SeedableRng };
    use rand_xorshift::XorShiftRng;

    use super::{ Bvh, BvhNodeData };
    use crate::scene::Scene;
    use crate::camera::Camera;
    use crate::shapes::{ Hit, Primitive, Shape, Sphere };
    use crate::types::{ Ray, V3 };

    fn random_spheres(count: usize, seed: u64) -> Vec<Primitive> {
        let mut rng = XorShiftRng::seed_from_u64(seed);
        (0..count)
            .map(|i| {
                let center = V3(
                    rng.random_range(-10.0..10.0),
                    rng.random_range(-10.0..10.0),
                    rng.random_range(-25.0..-5.0),
                );
                let radius = rng.random_range(0.1..0.8);
                Primitive::new(format!("sphere-{i}"), Shape::Sphere(Sphere::new(center, radius)))
            })
            .collect()
    }

    #[test]
    fn empty_scene_builds_an_empty_tree() {
        let bvh = Bvh::build(&[]);
        assert_eq!(bvh.node_count(), 0);
        let mut hit = Hit::default();
        assert!(!bvh.intersect(&Ray::new(V3::ZERO, V3::POS_X), &[], &mut hit));
    }

    #[test]
    fn prim_indices_is_a_permutation() {
        let objects = random_spheres(100, 11);
        let bvh = Bvh::build(&objects);
        let mut seen = bvh.prim_indices.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..objects.len()).collect::<Vec<_>>());
    }

    #[test]
    fn every_node_encloses_its_subtree() {
        let objects = random_spheres(200, 5);
        let bvh = Bvh::build(&objects);

        fn check(bvh: &Bvh, objects: &[Primitive], node_index: usize) {
            let node = &bvh.nodes[node_index];
            match node.data {
                BvhNodeData::Leaf { first, count } => {
                    for i in first..(first + count) {
                        let prim_box = objects[bvh.prim_indices[i]].bounds();
                        assert!(node.aabb.contains(&prim_box));
                    }
                }
                BvhNodeData::Branch { left, right } => {
                    assert!(node.aabb.contains(&bvh.nodes[left].aabb));
                    assert!(node.aabb.contains(&bvh.nodes[right].aabb));
                    check(bvh, objects, left);
                    check(bvh, objects, right);
                }
            }
        }

        check(&bvh, &objects, 0);
    }

    #[test]
    fn traversal_matches_the_linear_scan() {
        let mut scene = Scene::new(Camera::default());
        scene.objects = random_spheres(500, 42);
        let bvh = Bvh::build(&scene.objects);

        let mut rng = XorShiftRng::seed_from_u64(1);
        for _ in 0..2000 {
            let origin = V3(
                rng.random_range(-2.0..2.0),
                rng.random_range(-2.0..2.0),
                rng.random_range(-1.0..1.0),
            );
            let direction = V3(
                rng.random_range(-0.6..0.6),
                rng.random_range(-0.6..0.6),
                -1.0,
            ).unit();
            let ray = Ray::new(origin, direction);

            let mut linear_hit = Hit::default();
            let linear_found = scene.intersect_linear(&ray, &mut linear_hit);
            let mut bvh_hit = Hit::default();
            let bvh_found = bvh.intersect(&ray, &scene.objects, &mut bvh_hit);

            assert_eq!(linear_found, bvh_found);
            if linear_found {
                assert!((linear_hit.t - bvh_hit.t).abs() < 1.0e-6);
            }
        }
    }

    #[test]
    fn miss_restores_the_t_cursor() {
        let objects = random_spheres(10, 3);
        let bvh = Bvh::build(&objects);
        let mut hit = Hit::default();
        hit.t = 123.0;
        // Fire away from every sphere
        let ray = Ray::new(V3(0.0, 0.0, 50.0), V3(0.0, 0.0, 1.0));
        assert!(!bvh.intersect(&ray, &objects, &mut hit));
        assert_eq!(hit.t, 123.0);
    }

    #[test]
    fn coincident_primitives_still_build_and_hit() {
        // Identical centroids defeat both midpoint and median splits
        let objects = (0..8)
            .map(|i| Primitive::new(format!("s{i}"), Shape::Sphere(Sphere::new(V3(0.0, 0.0, -5.0), 1.0))))
            .collect::<Vec<_>>();
        let bvh = Bvh::build(&objects);
        let mut hit = Hit::default();
        assert!(bvh.intersect(&Ray::new(V3::ZERO, V3(0.0, 0.0, -1.0)), &objects, &mut hit));
        assert!((hit.t - 4.0).abs() < 1.0e-9);
    }
}
