//! # Transition Graph
//!
//! A static, finite table of arcs `(source, event) -> (target, guard?, actions[])`
//! for one domain. Graphs are assembled through [`TransitionGraphBuilder`], which
//! refuses tables that are not deterministic or mention undeclared states.

use super::actions::StateAction;
use super::domain::{WorkflowDomain, WorkflowState};
use super::errors::{StateMachineError, StateMachineResult};
use super::guards::StateGuard;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// One declared transition
pub struct TransitionArc<D: WorkflowDomain> {
    pub source: D::State,
    pub event: D::Event,
    pub target: D::State,
    guard: Option<Arc<dyn StateGuard<D>>>,
    actions: Vec<Arc<dyn StateAction<D>>>,
}

impl<D: WorkflowDomain> TransitionArc<D> {
    pub fn new(source: D::State, event: D::Event, target: D::State) -> Self {
        Self {
            source,
            event,
            target,
            guard: None,
            actions: Vec::new(),
        }
    }

    pub fn with_guard(mut self, guard: impl StateGuard<D> + 'static) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    /// Append an action; actions run in the order they were added
    pub fn with_action(mut self, action: impl StateAction<D> + 'static) -> Self {
        self.actions.push(Arc::new(action));
        self
    }

    pub fn with_shared_action(mut self, action: Arc<dyn StateAction<D>>) -> Self {
        self.actions.push(action);
        self
    }

    pub fn guard(&self) -> Option<&dyn StateGuard<D>> {
        self.guard.as_deref()
    }

    pub fn actions(&self) -> &[Arc<dyn StateAction<D>>] {
        &self.actions
    }

    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }
}

impl<D: WorkflowDomain> fmt::Debug for TransitionArc<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionArc")
            .field("source", &self.source)
            .field("event", &self.event)
            .field("target", &self.target)
            .field("guard", &self.guard.as_ref().map(|g| g.description()))
            .field(
                "actions",
                &self.actions.iter().map(|a| a.description()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Validated, immutable transition table for one domain
pub struct TransitionGraph<D: WorkflowDomain> {
    initial_state: D::State,
    end_states: Vec<D::State>,
    arcs: Vec<TransitionArc<D>>,
    index: HashMap<(D::State, D::Event), usize>,
}

impl<D: WorkflowDomain> TransitionGraph<D> {
    pub fn builder(initial_state: D::State) -> TransitionGraphBuilder<D> {
        TransitionGraphBuilder::new(initial_state)
    }

    pub fn initial_state(&self) -> D::State {
        self.initial_state
    }

    /// States the graph labels as final. Informational only: the arc table
    /// decides which events a state accepts.
    pub fn end_states(&self) -> &[D::State] {
        &self.end_states
    }

    pub fn is_end_state(&self, state: D::State) -> bool {
        self.end_states.contains(&state)
    }

    /// Look up the arc keyed by `(state, event)`
    pub fn arc(&self, state: D::State, event: D::Event) -> Option<&TransitionArc<D>> {
        self.index.get(&(state, event)).map(|&i| &self.arcs[i])
    }

    pub fn arcs(&self) -> impl Iterator<Item = &TransitionArc<D>> {
        self.arcs.iter()
    }

    /// Events accepted from `state`, in declaration order
    pub fn events_from(&self, state: D::State) -> Vec<D::Event> {
        self.arcs
            .iter()
            .filter(|arc| arc.source == state)
            .map(|arc| arc.event)
            .collect()
    }

    /// States with no outgoing arcs
    pub fn is_sink(&self, state: D::State) -> bool {
        !self.arcs.iter().any(|arc| arc.source == state)
    }

    /// Every state reachable from the initial state, the initial state included
    pub fn reachable_states(&self) -> HashSet<D::State> {
        let mut seen = HashSet::from([self.initial_state]);
        let mut queue = VecDeque::from([self.initial_state]);

        while let Some(state) = queue.pop_front() {
            for arc in self.arcs.iter().filter(|arc| arc.source == state) {
                if seen.insert(arc.target) {
                    queue.push_back(arc.target);
                }
            }
        }
        seen
    }

    pub fn is_reachable(&self, state: D::State) -> bool {
        self.reachable_states().contains(&state)
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }
}

impl<D: WorkflowDomain> fmt::Debug for TransitionGraph<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionGraph")
            .field("domain", &D::NAME)
            .field("initial_state", &self.initial_state)
            .field("end_states", &self.end_states)
            .field("arcs", &self.arcs)
            .finish()
    }
}

/// Builder for [`TransitionGraph`]
pub struct TransitionGraphBuilder<D: WorkflowDomain> {
    initial_state: D::State,
    end_states: Vec<D::State>,
    arcs: Vec<TransitionArc<D>>,
    every_arc: Vec<Arc<dyn StateAction<D>>>,
}

impl<D: WorkflowDomain> TransitionGraphBuilder<D> {
    fn new(initial_state: D::State) -> Self {
        Self {
            initial_state,
            end_states: Vec::new(),
            arcs: Vec::new(),
            every_arc: Vec::new(),
        }
    }

    pub fn end_states(mut self, states: impl IntoIterator<Item = D::State>) -> Self {
        self.end_states.extend(states);
        self
    }

    pub fn arc(mut self, arc: TransitionArc<D>) -> Self {
        self.arcs.push(arc);
        self
    }

    /// Action appended to every arc after its own actions
    pub fn on_every_arc(mut self, action: Arc<dyn StateAction<D>>) -> Self {
        self.every_arc.push(action);
        self
    }

    pub fn build(self) -> StateMachineResult<TransitionGraph<D>> {
        let declared: HashSet<D::State> = D::State::all().iter().copied().collect();
        let invalid = |reason: String| StateMachineError::InvalidGraph {
            domain: D::NAME,
            reason,
        };

        if !declared.contains(&self.initial_state) {
            return Err(invalid(format!(
                "initial state {} is not declared",
                self.initial_state
            )));
        }
        if let Some(state) = self.end_states.iter().find(|s| !declared.contains(s)) {
            return Err(invalid(format!("end state {state} is not declared")));
        }

        let mut index = HashMap::with_capacity(self.arcs.len());
        let mut arcs = Vec::with_capacity(self.arcs.len());

        for mut arc in self.arcs {
            for state in [arc.source, arc.target] {
                if !declared.contains(&state) {
                    return Err(invalid(format!("arc references undeclared state {state}")));
                }
            }
            if index.insert((arc.source, arc.event), arcs.len()).is_some() {
                return Err(invalid(format!(
                    "duplicate arc for ({}, {})",
                    arc.source, arc.event
                )));
            }
            arc.actions.extend(self.every_arc.iter().cloned());
            arcs.push(arc);
        }

        Ok(TransitionGraph {
            initial_state: self.initial_state,
            end_states: self.end_states,
            arcs,
            index,
        })
    }
}
