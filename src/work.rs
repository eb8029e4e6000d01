//! Update driver: plans which outputs need attention and walks the plan in
//! dependency order, one target at a time.

use crate::error::{Error, Result};
use crate::smallmap::SmallMap;
use crate::update::{UpdateContext, UpdateOutcome};
use crate::update_map::UpdateMap;
use std::collections::{HashMap, VecDeque};

/// Tracks progress through the requested updates.  A target is pending while
/// any of its generated inputs still needs updating, becomes ready when the
/// count reaches zero, and leaves the plan once it completes.
#[derive(Debug, Default)]
pub struct Plan {
    /// Number of not-yet-completed generated inputs per pending target.
    pending_input_counts: HashMap<String, usize>,
    /// Generated input -> targets awaiting it.  Insertion-ordered so the
    /// ready queue fills in a reproducible order.
    descendants_by_input: SmallMap<String, Vec<String>>,
    /// Targets whose generated inputs are all complete, FIFO.
    ready: VecDeque<String>,
}

impl Plan {
    pub fn new(map: &UpdateMap, targets: &[String]) -> Result<Plan> {
        let mut plan = Plan::default();
        for target in targets {
            if !map.contains(target) {
                return Err(Error::UnknownTarget {
                    path: target.clone(),
                });
            }
            plan.add_target(map, target);
        }
        Ok(plan)
    }

    fn add_target(&mut self, map: &UpdateMap, target: &str) {
        if self.pending_input_counts.contains_key(target) {
            return;
        }
        // Reserve the slot first so diamond dependencies are visited once.
        self.pending_input_counts.insert(target.to_string(), 0);
        let output_file = match map.get(target) {
            Some(output_file) => output_file,
            None => return,
        };
        let mut pending_inputs = 0;
        for input in &output_file.local_input_file_paths {
            if !map.contains(input) {
                // A plain source; freshness hashing covers it.
                continue;
            }
            pending_inputs += 1;
            match self.descendants_by_input.get_mut(input.as_str()) {
                Some(descendants) => descendants.push(target.to_string()),
                None => self
                    .descendants_by_input
                    .insert(input.clone(), vec![target.to_string()]),
            }
            self.add_target(map, input);
        }
        *self
            .pending_input_counts
            .get_mut(target)
            .expect("slot reserved above") = pending_inputs;
        if pending_inputs == 0 {
            self.ready.push_back(target.to_string());
        }
    }

    pub fn pop_ready(&mut self) -> Option<String> {
        self.ready.pop_front()
    }

    pub fn pending_count(&self, target: &str) -> Option<usize> {
        self.pending_input_counts.get(target).copied()
    }

    pub fn is_done(&self) -> bool {
        self.pending_input_counts.is_empty()
    }

    /// Mark `target` complete; descendants whose inputs are all complete
    /// move to the ready queue.
    pub fn mark_complete(&mut self, target: &str) -> Result<()> {
        self.pending_input_counts.remove(target);
        let descendants = match self.descendants_by_input.get(target) {
            Some(descendants) => descendants,
            None => return Ok(()),
        };
        for descendant in descendants {
            let count = self
                .pending_input_counts
                .get_mut(descendant)
                .ok_or_else(|| {
                    Error::InternalInvariant(format!("no pending count for `{descendant}`"))
                })?;
            if *count == 0 {
                return Err(Error::InternalInvariant(format!(
                    "pending count underflow for `{descendant}`"
                )));
            }
            *count -= 1;
            if *count == 0 {
                self.ready.push_back(descendant.clone());
            }
        }
        Ok(())
    }
}

/// Runs a plan to completion against an update context.
pub struct Work<'a> {
    pub plan: Plan,
    pub context: UpdateContext<'a>,
}

impl<'a> Work<'a> {
    pub fn new(plan: Plan, context: UpdateContext<'a>) -> Self {
        Work { plan, context }
    }

    /// Update everything in the plan, in dependency order.  Returns how many
    /// targets actually ran their command; up-to-date targets complete
    /// without running anything.
    pub fn run(&mut self) -> Result<usize> {
        let mut updated = 0;
        while let Some(target) = self.plan.pop_ready() {
            match self.context.update_file(&target)? {
                UpdateOutcome::UpToDate => {}
                UpdateOutcome::Updated => updated += 1,
            }
            self.plan.mark_complete(&target)?;
        }
        if !self.plan.is_done() {
            return Err(Error::InternalInvariant(
                "ready queue drained with targets still pending".to_string(),
            ));
        }
        Ok(updated)
    }
}
