//! A minimal gate-list IR and the passes of the demo transpiler.
//!
//! The pipeline built by [`transpiler`] mirrors a small optimization
//! level setup: validate and count first, then, when optimization is
//! enabled, cancel adjacent inverse pairs until the gate count reaches a
//! fixed point.

use arvak_passmanager::{
    ControllerOptions, FlowConditions, PassKind, PassManager, PassManagerError, PassResult,
    PropertySet, SharedTask, Task,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{TranspilerError, TranspilerResult};

/// A gate acting on a list of qubits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gate {
    pub name: String,
    pub qubits: Vec<u32>,
}

impl Gate {
    /// Create a gate.
    pub fn new(name: impl Into<String>, qubits: impl Into<Vec<u32>>) -> Self {
        Self {
            name: name.into(),
            qubits: qubits.into(),
        }
    }

    /// Check whether applying the gate twice is the identity.
    pub fn is_self_inverse(&self) -> bool {
        matches!(
            self.name.as_str(),
            "h" | "x" | "y" | "z" | "cx" | "cz" | "swap"
        )
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for q in &self.qubits {
            write!(f, " q[{q}]")?;
        }
        Ok(())
    }
}

/// A register of qubits and the gates applied to it, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateList {
    pub num_qubits: u32,
    pub gates: Vec<Gate>,
}

impl GateList {
    /// Create an empty gate list over `num_qubits` qubits.
    pub fn new(num_qubits: u32) -> Self {
        Self {
            num_qubits,
            gates: Vec::new(),
        }
    }

    /// Append a gate and return the updated list.
    #[must_use]
    pub fn with_gate(mut self, name: &str, qubits: &[u32]) -> Self {
        self.gates.push(Gate::new(name, qubits));
        self
    }

    /// Parse a `;`-separated program such as `"h 0; cx 0 1"`.
    pub fn parse(num_qubits: u32, program: &str) -> TranspilerResult<Self> {
        let mut list = Self::new(num_qubits);
        for statement in program.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let mut parts = statement.split_whitespace();
            let Some(name) = parts.next() else {
                continue;
            };
            let qubits = parts
                .map(|q| {
                    q.parse::<u32>().map_err(|e| TranspilerError::Parse {
                        statement: statement.to_string(),
                        reason: format!("invalid qubit '{q}': {e}"),
                    })
                })
                .collect::<TranspilerResult<Vec<_>>>()?;
            list.gates.push(Gate::new(name, qubits));
        }
        Ok(list)
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Check if there are no gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }
}

impl fmt::Display for GateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gates: Vec<String> = self.gates.iter().map(ToString::to_string).collect();
        write!(f, "{}", gates.join("; "))
    }
}

/// Rejects gates that act on qubits outside the register.
pub struct CheckQubits;

impl Task<GateList> for CheckQubits {
    fn name(&self) -> &str {
        "CheckQubits"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, ir: GateList, _properties: &mut PropertySet) -> PassResult<GateList> {
        for gate in &ir.gates {
            if let Some(q) = gate.qubits.iter().find(|&&q| q >= ir.num_qubits) {
                return Err(PassManagerError::pass_failed(
                    self.name(),
                    format!(
                        "gate '{gate}' acts on qubit {q}, register has {} qubits",
                        ir.num_qubits
                    ),
                ));
            }
        }
        Ok(ir)
    }
}

/// Records the gate count as `size` and per-gate counts as `count_ops`.
pub struct CountOps;

impl Task<GateList> for CountOps {
    fn name(&self) -> &str {
        "CountOps"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, ir: GateList, properties: &mut PropertySet) -> PassResult<GateList> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for gate in &ir.gates {
            *counts.entry(gate.name.as_str()).or_default() += 1;
        }
        let counts = serde_json::to_value(&counts)
            .map_err(|e| PassManagerError::pass_failed(self.name(), e.to_string()))?;

        properties.set("size", ir.len());
        properties.set("count_ops", counts);
        Ok(ir)
    }
}

/// Removes adjacent pairs of identical self-inverse gates.
///
/// One sweep only: a pair exposed by a removal is left for the next run.
pub struct CancelInversePairs;

impl Task<GateList> for CancelInversePairs {
    fn name(&self) -> &str {
        "CancelInversePairs"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, mut ir: GateList, _properties: &mut PropertySet) -> PassResult<GateList> {
        let mut kept = Vec::with_capacity(ir.gates.len());
        let mut gates = std::mem::take(&mut ir.gates).into_iter().peekable();
        while let Some(gate) = gates.next() {
            if gate.is_self_inverse() && gates.peek() == Some(&gate) {
                gates.next();
                continue;
            }
            kept.push(gate);
        }
        ir.gates = kept;
        Ok(ir)
    }
}

/// Sets `{property}_fixed_point` once `property` stops changing between
/// two runs.
pub struct FixedPoint {
    property: String,
}

impl FixedPoint {
    /// Watch `property`.
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
        }
    }

    /// Key of the flag this pass writes.
    pub fn flag(&self) -> String {
        format!("{}_fixed_point", self.property)
    }
}

impl Task<GateList> for FixedPoint {
    fn name(&self) -> &str {
        "FixedPoint"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn run(&self, ir: GateList, properties: &mut PropertySet) -> PassResult<GateList> {
        let previous_key = format!("_{}_previous", self.property);
        let current = properties.get(&self.property).cloned();
        let previous = properties.get(&previous_key).cloned();

        let fixed = current.is_some() && current == previous;
        properties.set(self.flag(), fixed);
        if let Some(current) = current {
            properties.set(previous_key, current);
        }
        Ok(ir)
    }
}

/// Build the demo transpiler for an optimization level.
///
/// Level 0 only validates and counts. Any higher level adds a loop that
/// cancels inverse pairs until the gate count stops changing.
pub fn transpiler(
    optimization_level: u8,
    options: ControllerOptions,
) -> TranspilerResult<PassManager<GateList, TranspilerError>> {
    let mut pm = PassManager::new().with_options(options);

    // Gate the whole loop on the optimization level: with the condition
    // innermost, a skipped body would never reach its fixed point.
    pm.factory_mut().set_hierarchy(["do_while", "condition"])?;

    let setup: Vec<SharedTask<GateList>> = vec![Arc::new(CheckQubits), Arc::new(CountOps)];
    pm.append(setup, FlowConditions::new())?;

    let fixed_point = FixedPoint::new("size");
    let flag = fixed_point.flag();
    let optimize: Vec<SharedTask<GateList>> = vec![
        Arc::new(CancelInversePairs),
        Arc::new(CountOps),
        Arc::new(fixed_point),
    ];
    pm.append(
        optimize,
        FlowConditions::new()
            .with("condition", move |_| optimization_level > 0)
            .with("do_while", move |props| {
                !props.get_as::<bool>(&flag).ok().flatten().unwrap_or(false)
            }),
    )?;

    Ok(pm)
}
