//! Language-independent syntax step layer.
//!
//! Every graph node gets a [`SyntaxStep`]: a normalized summary of what
//! the node means, plus the node ids its value depends on. Steps are the
//! only representation the symbolic evaluator and the detectors consult;
//! nothing downstream of this module looks at grammar kind strings.

pub mod builder;

use rustc_hash::FxHashMap;

use crate::graph::NId;

pub use builder::build;

/// Node id plus value dependencies, carried by every step variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMeta {
    pub n_id: NId,
    /// Ids of the nodes this step's value is computed from. Always
    /// already materialized: steps are built in post order.
    pub dependencies: Vec<NId>,
}

impl StepMeta {
    pub fn new(n_id: NId, dependencies: Vec<NId>) -> Self {
        Self { n_id, dependencies }
    }

    pub fn leaf(n_id: NId) -> Self {
        Self {
            n_id,
            dependencies: Vec::new(),
        }
    }
}

/// Normalized meaning of one graph node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxStep {
    /// `var_type var = <deps>` or an untyped binding.
    Declaration {
        meta: StepMeta,
        var: String,
        var_type: Option<String>,
    },
    /// `var = <deps>` or `var.attribute = <deps>`.
    Assignment {
        meta: StepMeta,
        var: String,
        attribute: Option<String>,
    },
    /// `expression.method(<deps>)`; `expression` is empty for bare calls.
    MethodInvocation {
        meta: StepMeta,
        method: String,
        expression: String,
    },
    /// Call whose callee is itself a call, e.g. `a().b()`. The inner
    /// call id is the first dependency.
    MethodInvocationChain { meta: StepMeta, method: String },
    /// `new class_type(<deps>)`.
    ObjectInstantiation { meta: StepMeta, class_type: String },
    ArrayInstantiation {
        meta: StepMeta,
    },
    /// Read of a variable by name.
    SymbolLookup { meta: StepMeta, symbol: String },
    /// `expression.member`; the base expression id is the dependency.
    MemberAccess {
        meta: StepMeta,
        expression: String,
        member: String,
    },
    /// String/number/bool/null literal. Template strings carry their
    /// interpolated expressions as dependencies.
    Literal { meta: StepMeta, value: String },
    BinaryOperation {
        meta: StepMeta,
        operator: String,
    },
    Return {
        meta: StepMeta,
    },
    MethodDeclaration {
        meta: StepMeta,
        name: String,
        /// Node ids of the parameter steps, in declaration order.
        parameters: Vec<NId>,
        /// Annotation / attribute names, brackets and `@` stripped.
        annotations: Vec<String>,
    },
    ClassDeclaration {
        meta: StepMeta,
        name: String,
        /// Base class / interface name tokens.
        bases: Vec<String>,
    },
    Parameter {
        meta: StepMeta,
        name: String,
        param_type: Option<String>,
    },
    /// Structurally transparent node: its value is the OR of its
    /// dependencies, nothing more.
    NoOp { meta: StepMeta },
}

impl SyntaxStep {
    pub fn meta(&self) -> &StepMeta {
        match self {
            SyntaxStep::Declaration { meta, .. }
            | SyntaxStep::Assignment { meta, .. }
            | SyntaxStep::MethodInvocation { meta, .. }
            | SyntaxStep::MethodInvocationChain { meta, .. }
            | SyntaxStep::ObjectInstantiation { meta, .. }
            | SyntaxStep::ArrayInstantiation { meta }
            | SyntaxStep::SymbolLookup { meta, .. }
            | SyntaxStep::MemberAccess { meta, .. }
            | SyntaxStep::Literal { meta, .. }
            | SyntaxStep::BinaryOperation { meta, .. }
            | SyntaxStep::Return { meta }
            | SyntaxStep::MethodDeclaration { meta, .. }
            | SyntaxStep::ClassDeclaration { meta, .. }
            | SyntaxStep::Parameter { meta, .. }
            | SyntaxStep::NoOp { meta } => meta,
        }
    }

    pub fn n_id(&self) -> NId {
        self.meta().n_id
    }

    pub fn dependencies(&self) -> &[NId] {
        &self.meta().dependencies
    }

    /// Callee name for invocation steps, `None` otherwise.
    pub fn method(&self) -> Option<&str> {
        match self {
            SyntaxStep::MethodInvocation { method, .. }
            | SyntaxStep::MethodInvocationChain { method, .. } => Some(method),
            _ => None,
        }
    }

    /// Last dot-separated segment of the callee, used for sink matching.
    pub fn method_tail(&self) -> Option<&str> {
        self.method().map(|m| m.rsplit('.').next().unwrap_or(m))
    }
}

/// All steps of one file, keyed by node id.
#[derive(Debug, Default)]
pub struct SyntaxGraph {
    steps: FxHashMap<NId, SyntaxStep>,
    /// Count of nodes that hit the missing-case degrade path.
    missing_cases: usize,
}

impl SyntaxGraph {
    pub fn step(&self, id: NId) -> Option<&SyntaxStep> {
        self.steps.get(&id)
    }

    pub fn insert(&mut self, step: SyntaxStep) {
        self.steps.insert(step.n_id(), step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn missing_cases(&self) -> usize {
        self.missing_cases
    }

    pub(crate) fn note_missing_case(&mut self) {
        self.missing_cases += 1;
    }

    /// Steps in ascending node id (document) order.
    pub fn steps_ordered(&self) -> Vec<&SyntaxStep> {
        let mut out: Vec<&SyntaxStep> = self.steps.values().collect();
        out.sort_by_key(|s| s.n_id());
        out
    }
}
