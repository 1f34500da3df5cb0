//! Stacking order of sibling widgets.

use trellis_core::{ElementId, ElementTree, WidgetHandle};

use crate::Toolkit;

/// Makes the native stacking order of `element`'s siblings follow model order.
///
/// Walks the children of `element`'s logical parent. The first visible child
/// with a widget in the same native parent as `element`'s widget goes to the
/// top; every following one is placed directly below the previous one.
pub fn fix_z_order<T: Toolkit>(tree: &ElementTree, toolkit: &mut T, element: ElementId) {
    let Some(parent) = tree.logical_parent(element) else {
        return;
    };
    let Some(widget) = tree.get(element).and_then(|el| el.widget()) else {
        return;
    };
    let native_parent = toolkit.native_parent(widget);
    restack(tree, toolkit, parent, native_parent);
}

/// Fixes the stacking order of every group of `parent`'s children that share
/// a native parent.
pub fn fix_children_z_order<T: Toolkit>(tree: &ElementTree, toolkit: &mut T, parent: ElementId) {
    let mut native_parents = Vec::new();
    for widget in stackable(tree, toolkit, parent) {
        let native_parent = toolkit.native_parent(widget);
        if !native_parents.contains(&native_parent) {
            native_parents.push(native_parent);
        }
    }
    for native_parent in native_parents {
        restack(tree, toolkit, parent, native_parent);
    }
}

/// Widgets of the visible, live children of `parent`, in model order.
fn stackable<T: Toolkit>(tree: &ElementTree, toolkit: &T, parent: ElementId) -> Vec<WidgetHandle> {
    tree.children(parent)
        .iter()
        .filter_map(|&child| tree.get(child))
        .filter(|child| child.visible())
        .filter_map(|child| child.widget())
        .filter(|&widget| !toolkit.is_disposed(widget))
        .collect()
}

fn restack<T: Toolkit>(
    tree: &ElementTree,
    toolkit: &mut T,
    parent: ElementId,
    native_parent: Option<WidgetHandle>,
) {
    let mut previous: Option<WidgetHandle> = None;
    for widget in stackable(tree, toolkit, parent) {
        if toolkit.native_parent(widget) != native_parent {
            continue;
        }
        match previous {
            None => toolkit.move_to_top(widget),
            Some(above) => toolkit.move_below(widget, above),
        }
        previous = Some(widget);
    }
}
