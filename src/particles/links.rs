//! Cables and rods between particles, or between a particle and a fixed anchor.

use glam::Vec3;

use super::contact::{ParticleContact, ParticleContactGenerator};
use crate::{
    config::UP,
    core::Particle,
    utils::allocator::{Arena, ParticleId},
};

fn positions(particles: &Arena<Particle>, ids: [ParticleId; 2]) -> Option<(Vec3, Vec3)> {
    Some((particles.get(ids[0])?.position, particles.get(ids[1])?.position))
}

/// Contact holding `length` between `from` and `to`, pushing `from` along
/// whichever direction restores it.
fn rod_contact(
    first: ParticleId,
    second: Option<ParticleId>,
    from: Vec3,
    to: Vec3,
    length: f32,
) -> Option<ParticleContact> {
    let current = from.distance(to);
    if current == length {
        return None;
    }

    let normal = (to - from).normalize_or_zero();
    let contact = if current > length {
        ParticleContact::new(first, second, normal, current - length)
    } else {
        ParticleContact::new(first, second, -normal, length - current)
    };
    Some(contact.with_restitution(0.0))
}

fn cable_contact(
    first: ParticleId,
    second: Option<ParticleId>,
    from: Vec3,
    to: Vec3,
    max_length: f32,
    restitution: f32,
) -> Option<ParticleContact> {
    let current = from.distance(to);
    if current < max_length {
        return None;
    }
    let normal = (to - from).normalize_or_zero();
    Some(ParticleContact::new(first, second, normal, current - max_length).with_restitution(restitution))
}

fn emit(contact: Option<ParticleContact>, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize {
    match contact {
        Some(contact) if limit > 0 => {
            contacts.push(contact);
            1
        }
        _ => 0,
    }
}

/// Slack link that snaps taut at `max_length`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleCable {
    pub particles: [ParticleId; 2],
    pub max_length: f32,
    pub restitution: f32,
}

impl ParticleContactGenerator for ParticleCable {
    fn add_contact(&self, particles: &Arena<Particle>, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize {
        let Some((a, b)) = positions(particles, self.particles) else {
            return 0;
        };
        let contact = cable_contact(
            self.particles[0],
            Some(self.particles[1]),
            a,
            b,
            self.max_length,
            self.restitution,
        );
        emit(contact, contacts, limit)
    }
}

/// Rigid link of fixed length.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRod {
    pub particles: [ParticleId; 2],
    pub length: f32,
}

impl ParticleContactGenerator for ParticleRod {
    fn add_contact(&self, particles: &Arena<Particle>, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize {
        let Some((a, b)) = positions(particles, self.particles) else {
            return 0;
        };
        let contact = rod_contact(self.particles[0], Some(self.particles[1]), a, b, self.length);
        emit(contact, contacts, limit)
    }
}

/// Cable from a particle to a fixed point in space.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleCableConstraint {
    pub particle: ParticleId,
    pub anchor: Vec3,
    pub max_length: f32,
    pub restitution: f32,
}

impl ParticleContactGenerator for ParticleCableConstraint {
    fn add_contact(&self, particles: &Arena<Particle>, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize {
        let Some(particle) = particles.get(self.particle) else {
            return 0;
        };
        let contact = cable_contact(
            self.particle,
            None,
            particle.position,
            self.anchor,
            self.max_length,
            self.restitution,
        );
        emit(contact, contacts, limit)
    }
}

/// Rod from a particle to a fixed point in space.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRodConstraint {
    pub particle: ParticleId,
    pub anchor: Vec3,
    pub length: f32,
}

impl ParticleContactGenerator for ParticleRodConstraint {
    fn add_contact(&self, particles: &Arena<Particle>, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize {
        let Some(particle) = particles.get(self.particle) else {
            return 0;
        };
        let contact = rod_contact(self.particle, None, particle.position, self.anchor, self.length);
        emit(contact, contacts, limit)
    }
}

/// Keeps every particle in the world above `y = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContacts {
    pub restitution: f32,
}

impl Default for GroundContacts {
    fn default() -> Self {
        Self { restitution: 0.2 }
    }
}

impl ParticleContactGenerator for GroundContacts {
    fn add_contact(&self, particles: &Arena<Particle>, contacts: &mut Vec<ParticleContact>, limit: usize) -> usize {
        let mut count = 0;
        for (id, particle) in particles.entries() {
            if count >= limit {
                break;
            }
            let y = particle.position.y;
            if y < 0.0 {
                contacts.push(ParticleContact::new(id, None, UP, -y).with_restitution(self.restitution));
                count += 1;
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn two_particles(gap: f32) -> (Arena<Particle>, [ParticleId; 2]) {
        let mut particles = Arena::new();
        let a = particles.insert(Particle::new(Vec3::ZERO, 1.0));
        let b = particles.insert(Particle::new(Vec3::new(gap, 0.0, 0.0), 1.0));
        (particles, [a, b])
    }

    #[test]
    fn cable_only_acts_when_taut() {
        let (particles, ids) = two_particles(1.5);
        let slack = ParticleCable {
            particles: ids,
            max_length: 2.0,
            restitution: 0.3,
        };
        let mut contacts = Vec::new();
        assert_eq!(slack.add_contact(&particles, &mut contacts, 4), 0);

        let taut = ParticleCable { max_length: 1.0, ..slack };
        assert_eq!(taut.add_contact(&particles, &mut contacts, 4), 1);
        assert_abs_diff_eq!(contacts[0].penetration, 0.5);
        assert_eq!(contacts[0].normal, Vec3::X);
        assert_eq!(contacts[0].restitution, 0.3);
    }

    #[test]
    fn rod_pushes_or_pulls() {
        let (particles, ids) = two_particles(1.5);
        let mut contacts = Vec::new();

        let short = ParticleRod { particles: ids, length: 1.0 };
        assert_eq!(short.add_contact(&particles, &mut contacts, 4), 1);
        assert_eq!(contacts[0].normal, Vec3::X);
        assert_abs_diff_eq!(contacts[0].penetration, 0.5);

        let long = ParticleRod { particles: ids, length: 2.0 };
        assert_eq!(long.add_contact(&particles, &mut contacts, 4), 1);
        assert_eq!(contacts[1].normal, -Vec3::X);
        assert_abs_diff_eq!(contacts[1].penetration, 0.5);
        assert_eq!(contacts[1].restitution, 0.0);

        let exact = ParticleRod { particles: ids, length: 1.5 };
        assert_eq!(exact.add_contact(&particles, &mut contacts, 4), 0);
    }

    #[test]
    fn anchored_constraints_point_at_anchor() {
        let mut particles = Arena::new();
        let p = particles.insert(Particle::new(Vec3::new(0.0, 1.0, 0.0), 1.0));
        let mut contacts = Vec::new();

        let cable = ParticleCableConstraint {
            particle: p,
            anchor: Vec3::new(0.0, 4.0, 0.0),
            max_length: 2.0,
            restitution: 0.5,
        };
        assert_eq!(cable.add_contact(&particles, &mut contacts, 4), 1);
        assert_eq!(contacts[0].normal, Vec3::Y);
        assert_abs_diff_eq!(contacts[0].penetration, 1.0);
        assert_eq!(contacts[0].particles[1], None);

        let rod = ParticleRodConstraint {
            particle: p,
            anchor: Vec3::new(0.0, 4.0, 0.0),
            length: 2.0,
        };
        assert_eq!(rod.add_contact(&particles, &mut contacts, 0), 0);
        assert_eq!(contacts.len(), 1);
    }

    #[test]
    fn ground_catches_particles_below_zero() {
        let mut particles = Arena::new();
        particles.insert(Particle::new(Vec3::new(0.0, 1.0, 0.0), 1.0));
        let sunk = particles.insert(Particle::new(Vec3::new(0.0, -0.25, 0.0), 1.0));

        let mut contacts = Vec::new();
        assert_eq!(GroundContacts::default().add_contact(&particles, &mut contacts, 8), 1);
        assert_eq!(contacts[0].particles[0], Some(sunk));
        assert_eq!(contacts[0].normal, UP);
        assert_abs_diff_eq!(contacts[0].penetration, 0.25);
        assert_eq!(contacts[0].restitution, 0.2);
    }
}
