use crate::classes::FunctionInfo;
use crate::ir::{ClassName, MethodName};
use std::collections::HashMap;
use std::rc::Rc;

/// The ordered virtual-dispatch table of a class.
///
/// No two slots share a method name: an override replaces the inherited entry at its existing
/// position, a new method appends. Slot order is therefore stable all the way down the
/// hierarchy, which is what makes the slot index usable for dynamic dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct VTable {
    pub slots: Vec<FunctionInfo>,
}

impl VTable {
    /// Folds the collected method list into dispatch slots: replace on a name match, append
    /// otherwise.
    pub(super) fn from_methods(collected: Vec<FunctionInfo>) -> Self {
        let mut slots: Vec<FunctionInfo> = Vec::new();
        for method in collected {
            match slots.iter().position(|s| s.method == method.method) {
                Some(index) => slots[index] = method,
                None => slots.push(method),
            }
        }
        Self { slots }
    }

    /// Returns the dispatch slot of a method, if present.
    pub fn slot_of(&self, method: &MethodName) -> Option<u32> {
        self.slots
            .iter()
            .position(|s| s.method == *method)
            .map(|index| index as u32)
    }
}

/// Planner of virtual and interface dispatch, memoizing both table kinds per class.
///
/// Correctness of the caches depends on class infos being frozen before the first lookup, which
/// the build phases enforce: preprocessing completes before any body is emitted.
pub struct VirtualTables {
    pub(super) vtables: HashMap<(ClassName, bool), Rc<VTable>>,
    pub(super) itables: HashMap<ClassName, Rc<Vec<ClassName>>>,
}

impl VirtualTables {
    pub fn new() -> Self {
        Self {
            vtables: HashMap::new(),
            itables: HashMap::new(),
        }
    }
}

impl Default for VirtualTables {
    fn default() -> Self {
        Self::new()
    }
}
