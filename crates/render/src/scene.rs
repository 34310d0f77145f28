use std::cell::{Ref, RefCell};
use std::rc::Rc;

use glam::Vec2;

/// Drawable state of one scene-graph node.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    /// Position relative to the parent.
    pub position: Vec2,
    pub alpha: f32,
    pub visible: bool,
    /// Free-form text a renderer may draw (labels, sprite names).
    pub label: Option<String>,
    children: Vec<Container>,
}

impl Node {
    pub fn children(&self) -> &[Container] {
        &self.children
    }
}

/// Shared handle to a scene-graph node.
#[derive(Debug, Clone)]
pub struct Container(Rc<RefCell<Node>>);

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Rc::new(RefCell::new(Node {
            name: name.into(),
            position: Vec2::ZERO,
            alpha: 1.0,
            visible: true,
            label: None,
            children: Vec::new(),
        })))
    }

    pub fn node(&self) -> Ref<'_, Node> {
        self.0.borrow()
    }

    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    pub fn position(&self) -> Vec2 {
        self.0.borrow().position
    }

    pub fn set_position(&self, position: Vec2) {
        self.0.borrow_mut().position = position;
    }

    pub fn set_alpha(&self, alpha: f32) {
        self.0.borrow_mut().alpha = alpha;
    }

    pub fn set_visible(&self, visible: bool) {
        self.0.borrow_mut().visible = visible;
    }

    pub fn set_label(&self, label: impl Into<String>) {
        self.0.borrow_mut().label = Some(label.into());
    }

    /// Append `child`; it is drawn after existing children.
    pub fn add_child(&self, child: &Container) {
        self.0.borrow_mut().children.push(child.clone());
    }

    /// Detach `child`. Returns `false` if it was not a direct child.
    pub fn remove_child(&self, child: &Container) -> bool {
        let mut node = self.0.borrow_mut();
        match node.children.iter().position(|c| c.ptr_eq(child)) {
            Some(pos) => {
                node.children.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    pub fn children(&self) -> Vec<Container> {
        self.0.borrow().children.clone()
    }

    pub fn ptr_eq(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Depth-first pre-order traversal; `visit` receives the depth and the
    /// node's absolute position.
    pub fn walk(&self, visit: &mut dyn FnMut(usize, Vec2, &Node)) {
        self.walk_from(0, Vec2::ZERO, visit);
    }

    fn walk_from(&self, depth: usize, origin: Vec2, visit: &mut dyn FnMut(usize, Vec2, &Node)) {
        let node = self.0.borrow();
        let absolute = origin + node.position;
        visit(depth, absolute, &node);
        for child in &node.children {
            child.walk_from(depth + 1, absolute, visit);
        }
    }

    /// Total nodes in this subtree, including itself.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_, _, _| count += 1);
        count
    }
}
