use crate::classes::FunctionInfo;
use crate::context::Context;
use crate::error::CodegenError;
use crate::ir::{ClassName, MethodName};
use crate::virtuals::{VTable, VirtualTables};
use itertools::Itertools;
use log::Level;
use std::rc::Rc;

impl VirtualTables {
    /// Returns the vtable used to lay out a class's vtable struct type. Abstract slots are
    /// included: every slot must be typed, whether or not this class can fill it.
    pub fn vtable_type(&mut self, ctx: &Context, class: &ClassName) -> anyhow::Result<Rc<VTable>> {
        self.vtable(ctx, class, true)
    }

    /// Returns the vtable used to populate a class's global vtable instance. Abstract slots are
    /// excluded, so every remaining slot carries a concrete function reference.
    pub fn global_vtable(&mut self, ctx: &Context, class: &ClassName) -> anyhow::Result<Rc<VTable>> {
        self.vtable(ctx, class, false)
    }

    fn vtable(
        &mut self,
        ctx: &Context,
        class: &ClassName,
        include_abstract: bool,
    ) -> anyhow::Result<Rc<VTable>> {
        let key = (class.clone(), include_abstract);
        if let Some(table) = self.vtables.get(&key) {
            return Ok(Rc::clone(table));
        }
        let mut collected = Vec::new();
        collect_methods(ctx, class, include_abstract, &mut collected)?;
        let table = Rc::new(VTable::from_methods(collected));
        self.vtables.insert(key, Rc::clone(&table));
        Ok(table)
    }

    /// Returns the ordered interface-dispatch tables of a class: the super class's itables, then
    /// those of each declared interface, then the class itself if it is an interface.
    ///
    /// Duplicates are preserved on purpose: method resolution scans from the end, so a
    /// more-derived interface re-declaring an inherited method shadows the earlier occurrence.
    /// Deduplicating here would break that tie-break.
    pub fn itables(&mut self, ctx: &Context, class: &ClassName) -> anyhow::Result<Rc<Vec<ClassName>>> {
        if let Some(itables) = self.itables.get(class) {
            return Ok(Rc::clone(itables));
        }
        let mut collected = Vec::new();
        collect_interfaces(ctx, class, &mut collected)?;
        let itables = Rc::new(collected);
        self.itables.insert(class.clone(), Rc::clone(&itables));
        Ok(itables)
    }

    /// Resolves a method against a class's itables, returning `(itable index, method index)`.
    ///
    /// Both scans run back-to-front: the last interface declaring the method wins, and within
    /// that interface the last declaration wins.
    pub fn resolve_method(
        &mut self,
        ctx: &Context,
        class: &ClassName,
        method: &MethodName,
    ) -> anyhow::Result<(u32, u32)> {
        let itables = self.itables(ctx, class)?;
        for (itable_idx, interface) in itables.iter().enumerate().rev() {
            let info = ctx.class_info(interface)?;
            if let Some(method_idx) = info.methods.iter().rposition(|m| m.method == *method) {
                return Ok((itable_idx as u32, method_idx as u32));
            }
        }
        bail!(CodegenError::MethodNotFound {
            class: class.clone(),
            method: method.name_string(),
        })
    }

    /// Logs all computed vtables to the console at log level [`Level::Debug`].
    pub fn dump(&self) {
        if !log_enabled!(Level::Debug) {
            return;
        }
        debug!("Virtual dispatch tables:");
        for ((class, include_abstract), table) in self.vtables.iter().sorted_by_key(|((c, a), _)| (c.clone(), *a)) {
            debug!("  {} (abstract slots: {})", class, include_abstract);
            for (i, slot) in table.slots.iter().enumerate() {
                debug!("{:>6}: {} -> {}", i, slot.method, slot.class);
            }
        }
    }
}

/// Collects all methods callable on `class`: the super class's methods, then each interface's,
/// then the class's own (with abstract ones filtered out unless requested). The caller folds the
/// result into dispatch slots.
fn collect_methods(
    ctx: &Context,
    class: &ClassName,
    include_abstract: bool,
    out: &mut Vec<FunctionInfo>,
) -> anyhow::Result<()> {
    let info = ctx.class_info(class)?;
    if let Some(super_class) = &info.super_class {
        collect_methods(ctx, super_class, include_abstract, out)?;
    }
    for interface in &info.interfaces {
        collect_methods(ctx, interface, include_abstract, out)?;
    }
    out.extend(
        info.methods
            .iter()
            .filter(|m| include_abstract || !m.is_abstract)
            .cloned(),
    );
    Ok(())
}

/// Collects the implemented interfaces of `class` bottom-up, keeping duplicates.
fn collect_interfaces(
    ctx: &Context,
    class: &ClassName,
    out: &mut Vec<ClassName>,
) -> anyhow::Result<()> {
    let info = ctx.class_info(class)?;
    if let Some(super_class) = &info.super_class {
        collect_interfaces(ctx, super_class, out)?;
    }
    for interface in &info.interfaces {
        collect_interfaces(ctx, interface, out)?;
    }
    if info.is_interface() {
        out.push(class.clone());
    }
    Ok(())
}
