//! Priority-ordered iterative contact resolution.

use log::warn;

use crate::{
    config::{DEFAULT_POSITION_EPSILON, DEFAULT_VELOCITY_EPSILON},
    core::RigidBody,
    dynamics::contact::Contact,
    utils::{
        allocator::{Arena, BodyId},
        logging::log_iteration_usage,
    },
};

/// Resolves a batch of contacts in two passes: interpenetration first,
/// then velocity. Each pass repeatedly takes the worst contact, resolves
/// it in isolation and patches every contact sharing a body.
#[derive(Debug, Clone)]
pub struct ContactResolver {
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    pub velocity_epsilon: f32,
    pub position_epsilon: f32,
    velocity_iterations_used: usize,
    position_iterations_used: usize,
}

impl ContactResolver {
    pub fn new(iterations: usize) -> Self {
        Self::with_epsilons(iterations, DEFAULT_VELOCITY_EPSILON, DEFAULT_POSITION_EPSILON)
    }

    pub fn with_epsilons(iterations: usize, velocity_epsilon: f32, position_epsilon: f32) -> Self {
        Self {
            velocity_iterations: iterations,
            position_iterations: iterations,
            velocity_epsilon,
            position_epsilon,
            velocity_iterations_used: 0,
            position_iterations_used: 0,
        }
    }

    pub fn set_iterations(&mut self, velocity: usize, position: usize) {
        self.velocity_iterations = velocity;
        self.position_iterations = position;
    }

    pub fn set_epsilon(&mut self, velocity: f32, position: f32) {
        self.velocity_epsilon = velocity;
        self.position_epsilon = position;
    }

    pub fn is_valid(&self) -> bool {
        self.velocity_iterations > 0
            && self.position_iterations > 0
            && self.velocity_epsilon >= 0.0
            && self.position_epsilon >= 0.0
    }

    pub fn velocity_iterations_used(&self) -> usize {
        self.velocity_iterations_used
    }

    pub fn position_iterations_used(&self) -> usize {
        self.position_iterations_used
    }

    /// Resolves `contacts` against `bodies`. An empty batch is a no-op.
    pub fn resolve_contacts(&mut self, contacts: &mut [Contact], bodies: &mut Arena<RigidBody>, dt: f32) {
        self.velocity_iterations_used = 0;
        self.position_iterations_used = 0;

        if contacts.is_empty() {
            return;
        }
        if !self.is_valid() {
            warn!(
                "contact resolver settings are invalid (iterations {}/{}, epsilons {}/{}); skipping",
                self.velocity_iterations,
                self.position_iterations,
                self.velocity_epsilon,
                self.position_epsilon
            );
            return;
        }

        Self::prepare_contacts(contacts, bodies, dt);
        self.adjust_positions(contacts, bodies);
        self.adjust_velocities(contacts, bodies, dt);
    }

    fn prepare_contacts(contacts: &mut [Contact], bodies: &Arena<RigidBody>, dt: f32) {
        for contact in contacts.iter_mut() {
            contact.calculate_internals(bodies, dt);
        }
    }

    fn adjust_positions(&mut self, contacts: &mut [Contact], bodies: &mut Arena<RigidBody>) {
        while self.position_iterations_used < self.position_iterations {
            let Some((index, max)) = worst(contacts, self.position_epsilon, |c| c.penetration) else {
                break;
            };

            contacts[index].match_awake_state(bodies);
            let change = contacts[index].apply_position_change(bodies, max);
            let resolved = contacts[index].bodies;

            for contact in contacts.iter_mut() {
                for_each_shared_body(contact, &resolved, |contact, b, d| {
                    let delta = change.linear[d]
                        + change.angular[d].cross(contact.relative_contact_position(b));
                    let sign = if b == 1 { 1.0 } else { -1.0 };
                    contact.penetration += delta.dot(contact.normal) * sign;
                });
            }

            self.position_iterations_used += 1;
        }
        log_iteration_usage(
            "contacts::positions",
            self.position_iterations_used,
            self.position_iterations,
        );
    }

    fn adjust_velocities(&mut self, contacts: &mut [Contact], bodies: &mut Arena<RigidBody>, dt: f32) {
        while self.velocity_iterations_used < self.velocity_iterations {
            let Some((index, _)) = worst(contacts, self.velocity_epsilon, |c| c.desired_delta_velocity())
            else {
                break;
            };

            contacts[index].match_awake_state(bodies);
            let change = contacts[index].apply_velocity_change(bodies);
            let resolved = contacts[index].bodies;

            for contact in contacts.iter_mut() {
                let mut touched = false;
                for_each_shared_body(contact, &resolved, |contact, b, d| {
                    let delta = change.linear[d]
                        + change.angular[d].cross(contact.relative_contact_position(b));
                    let sign = if b == 1 { -1.0 } else { 1.0 };
                    contact.adjust_contact_velocity(delta, sign);
                    touched = true;
                });
                if touched {
                    contact.calculate_desired_delta_velocity(bodies, dt);
                }
            }

            self.velocity_iterations_used += 1;
        }
        log_iteration_usage(
            "contacts::velocities",
            self.velocity_iterations_used,
            self.velocity_iterations,
        );
    }
}

/// Index and value of the contact with the largest `key` above `epsilon`.
fn worst(contacts: &[Contact], epsilon: f32, key: impl Fn(&Contact) -> f32) -> Option<(usize, f32)> {
    let mut best = None;
    let mut max = epsilon;
    for (index, contact) in contacts.iter().enumerate() {
        let value = key(contact);
        if value > max {
            max = value;
            best = Some((index, value));
        }
    }
    best
}

/// Calls `f(contact, b, d)` for every slot `b` of `contact` holding the
/// body found in slot `d` of the resolved contact.
fn for_each_shared_body(
    contact: &mut Contact,
    resolved: &[Option<BodyId>; 2],
    mut f: impl FnMut(&mut Contact, usize, usize),
) {
    for b in 0..2 {
        let Some(body) = contact.bodies[b] else {
            continue;
        };
        for (d, other) in resolved.iter().enumerate() {
            if *other == Some(body) {
                f(contact, b, d);
            }
        }
    }
}
