//! Model node trees.
//!
//! A model is a tree of nodes, each carrying a local transform and a set of
//! surfaces. World transforms are accumulated during traversal; nothing is
//! cached scene-side, the renderer visits the tree once per frame.

use crate::scene::{material::Material, mesh::SurfaceData};
use nalgebra::Matrix4;
use std::rc::Rc;

/// A drawable piece of a node: shared geometry plus its material. The same
/// `Rc<SurfaceData>` may back any number of surfaces; the renderer's geometry
/// cache keys on the data id, so shared geometry is uploaded once.
#[derive(Clone)]
pub struct Surface {
    /// Geometry, shared by reference count.
    pub data: Rc<SurfaceData>,
    /// Material the geometry is rendered with.
    pub material: Material,
}

/// A node of a model tree.
#[derive(Clone)]
pub struct ModelNode {
    /// Transform relative to the parent node.
    pub local_transform: Matrix4<f32>,
    /// Surfaces attached to this node.
    pub surfaces: Vec<Surface>,
    /// Child nodes.
    pub children: Vec<ModelNode>,
}

impl Default for ModelNode {
    fn default() -> Self {
        Self {
            local_transform: Matrix4::identity(),
            surfaces: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl ModelNode {
    /// Creates an empty node with the given local transform.
    pub fn with_transform(local_transform: Matrix4<f32>) -> Self {
        Self {
            local_transform,
            ..Default::default()
        }
    }
}

/// A tree of [`ModelNode`]s.
#[derive(Clone, Default)]
pub struct Model {
    /// Root node of the tree.
    pub root: ModelNode,
}

impl Model {
    /// Creates a model from its root node.
    pub fn new(root: ModelNode) -> Self {
        Self { root }
    }

    /// Depth-first pre-order traversal yielding each node together with its
    /// accumulated world transform. Children are visited in declaration
    /// order. Iterative, so arbitrarily deep trees cannot overflow the stack.
    pub fn traverse(&self) -> ModelTraversal<'_> {
        ModelTraversal {
            stack: vec![(&self.root, self.root.local_transform)],
        }
    }
}

/// Iterator over `(node, world transform)` pairs, see [`Model::traverse`].
pub struct ModelTraversal<'a> {
    stack: Vec<(&'a ModelNode, Matrix4<f32>)>,
}

impl<'a> Iterator for ModelTraversal<'a> {
    type Item = (&'a ModelNode, Matrix4<f32>);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, world_transform) = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push((child, world_transform * child.local_transform));
        }
        Some((node, world_transform))
    }
}

#[cfg(test)]
mod test {
    use super::{Model, ModelNode};
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Vector3};

    fn translation(x: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_traversal_order_is_depth_first_preorder() {
        // root
        // ├── a
        // │   └── b
        // └── c
        let model = Model::new(ModelNode {
            local_transform: translation(0.0),
            surfaces: Vec::new(),
            children: vec![
                ModelNode {
                    local_transform: translation(1.0),
                    surfaces: Vec::new(),
                    children: vec![ModelNode::with_transform(translation(2.0))],
                },
                ModelNode::with_transform(translation(10.0)),
            ],
        });

        let xs: Vec<f32> = model
            .traverse()
            .map(|(_, world)| world[(0, 3)])
            .collect();
        assert_eq!(xs, vec![0.0, 1.0, 3.0, 10.0]);
    }

    #[test]
    fn test_world_transform_accumulation() {
        let mut grandchild = ModelNode::with_transform(translation(3.0));
        grandchild.local_transform *= Matrix4::new_scaling(2.0);

        let model = Model::new(ModelNode {
            local_transform: translation(1.0),
            surfaces: Vec::new(),
            children: vec![ModelNode {
                local_transform: translation(1.0),
                surfaces: Vec::new(),
                children: vec![grandchild],
            }],
        });

        let (_, world) = model.traverse().last().unwrap();
        let p = world.transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));
        // 1 + 1 + 3 + 2 * 1.
        assert_relative_eq!(p.x, 7.0);
    }

    #[test]
    fn test_deep_tree_does_not_recurse() {
        let mut root = ModelNode::with_transform(translation(1.0));
        let mut cursor = &mut root;
        for _ in 0..10_000 {
            cursor.children.push(ModelNode::with_transform(translation(1.0)));
            cursor = &mut cursor.children[0];
        }
        let model = Model::new(root);
        assert_eq!(model.traverse().count(), 10_001);
    }
}
