use crate::ir::names::{ClassName, FieldName, MethodName};
use crate::ir::types::{ClassKind, Primitive, Type};
use bitflags::bitflags;
use std::collections::HashMap;

bitflags! {
    /// Flags attached to a [`Tree::Apply`] call site.
    #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct ApplyFlags: u8 {
        /// Statically dispatched call to a private method, never through a vtable.
        const PRIVATE = 1 << 0;
        /// Constructor invocation.
        const CONSTRUCTOR = 1 << 1;
    }
}

/// Namespace of a method definition within its class.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MemberNamespace {
    Public,
    Static,
    Private,
    Constructor,
    StaticConstructor,
}

impl MemberNamespace {
    pub fn is_constructor(self) -> bool {
        matches!(
            self,
            MemberNamespace::Constructor | MemberNamespace::StaticConstructor
        )
    }
}

/// Literal values carried by [`Tree::Literal`] nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Boolean(bool),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

/// Expression trees of the input IR.
///
/// This is the subset of nodes the back-end inspects; every node knows its static type. The
/// preprocessor only cares about [`Tree::Apply`], but it must be able to walk arbitrary method
/// bodies to find them, so all nodes expose their children via [`Tree::children`].
#[derive(Debug, Clone, PartialEq)]
pub enum Tree {
    Skip,
    Block(Vec<Tree>),
    Literal(Literal),
    Null,
    VarRef {
        name: String,
        tpe: Type,
    },
    This {
        tpe: Type,
    },
    Select {
        qualifier: Box<Tree>,
        field: FieldName,
        tpe: Type,
    },
    Assign {
        lhs: Box<Tree>,
        rhs: Box<Tree>,
    },
    If {
        cond: Box<Tree>,
        thenp: Box<Tree>,
        elsep: Box<Tree>,
        tpe: Type,
    },
    New {
        class: ClassName,
        args: Vec<Tree>,
    },
    Apply {
        flags: ApplyFlags,
        receiver: Box<Tree>,
        method: MethodName,
        args: Vec<Tree>,
        tpe: Type,
    },
}

impl Tree {
    /// Returns the static type of this expression.
    pub fn tpe(&self) -> Type {
        match self {
            Tree::Skip => Type::Void,
            Tree::Block(stats) => stats.last().map_or(Type::Void, Tree::tpe),
            Tree::Literal(Literal::Boolean(_)) => Type::Prim(Primitive::Boolean),
            Tree::Literal(Literal::Char(_)) => Type::Prim(Primitive::Char),
            Tree::Literal(Literal::Int(_)) => Type::Prim(Primitive::Int),
            Tree::Literal(Literal::Long(_)) => Type::Prim(Primitive::Long),
            Tree::Literal(Literal::Float(_)) => Type::Prim(Primitive::Float),
            Tree::Literal(Literal::Double(_)) => Type::Prim(Primitive::Double),
            Tree::Literal(Literal::Str(_)) => Type::Any,
            Tree::Null => Type::Any,
            Tree::VarRef { tpe, .. } => tpe.clone(),
            Tree::This { tpe } => tpe.clone(),
            Tree::Select { tpe, .. } => tpe.clone(),
            Tree::Assign { .. } => Type::Void,
            Tree::If { tpe, .. } => tpe.clone(),
            Tree::New { class, .. } => Type::Class(class.clone()),
            Tree::Apply { tpe, .. } => tpe.clone(),
        }
    }

    /// Returns the direct sub-trees of this node, in source order.
    pub fn children(&self) -> Vec<&Tree> {
        match self {
            Tree::Skip | Tree::Literal(_) | Tree::Null | Tree::VarRef { .. } | Tree::This { .. } => {
                vec![]
            }
            Tree::Block(stats) => stats.iter().collect(),
            Tree::Select { qualifier, .. } => vec![qualifier.as_ref()],
            Tree::Assign { lhs, rhs } => vec![lhs.as_ref(), rhs.as_ref()],
            Tree::If { cond, thenp, elsep, .. } => {
                vec![cond.as_ref(), thenp.as_ref(), elsep.as_ref()]
            }
            Tree::New { args, .. } => args.iter().collect(),
            Tree::Apply { receiver, args, .. } => {
                let mut children = vec![receiver.as_ref()];
                children.extend(args.iter());
                children
            }
        }
    }

    /// Pre-order traversal of this tree, calling `f` on every node.
    pub fn traverse<F: FnMut(&Tree)>(&self, f: &mut F) {
        f(self);
        for child in self.children() {
            child.traverse(f);
        }
    }
}

/// Load specification of a JS-native class or member, passed through untouched for the external
/// JS glue emitter.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LoadSpec {
    /// A global variable reference followed by a path of property selections.
    Global(String, Vec<String>),
    /// A module import followed by a path of property selections.
    Import(String, Vec<String>),
}

/// A single method definition of a linked class.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    pub namespace: MemberNamespace,
    pub name: MethodName,
    pub args: Vec<(String, Type)>,
    pub result_type: Type,
    /// `None` for abstract methods and native members.
    pub body: Option<Tree>,
}

/// A single field definition of a linked class.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FieldDef {
    pub name: FieldName,
    pub tpe: Type,
}

/// A class as produced by the upstream linker: resolved, with its ancestor list precomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedClass {
    pub name: ClassName,
    pub kind: ClassKind,
    pub super_class: Option<ClassName>,
    pub interfaces: Vec<ClassName>,
    /// Self plus all transitive super classes and interfaces, as computed by the linker.
    pub ancestors: Vec<ClassName>,
    pub methods: Vec<MethodDef>,
    pub fields: Vec<FieldDef>,
    pub js_native_load_spec: Option<LoadSpec>,
    pub js_native_members: HashMap<MethodName, LoadSpec>,
    /// Bodies of exported members; walked by the preprocessor like method bodies.
    pub exported_members: Vec<Tree>,
}

/// Entry points to run when the module is instantiated.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleInitializer {
    VoidMainMethod(ClassName, MethodName),
    /// Recognized but ignored: the runtime has no string-array bridge to build `argv` with yet.
    MainMethodWithArgs(ClassName, MethodName, Vec<String>),
}
