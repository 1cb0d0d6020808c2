use crate::config::{default_occupations, Config};
use crate::system::AtomicSystem;
use ::basis::Lattice;
use color_eyre::eyre::{eyre, Result, WrapErr};
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;
use tracing::info;

/// Build the periodic system defined in the YAML configuration.
///
/// Ionic charges default to the atomic number of each element and occupations to a
/// closed-shell filling of the total charge.
pub fn build_system(config: &Config) -> Result<AtomicSystem> {
    info!("Preparing periodic system...");
    let system = &config.system;

    let lattice = Lattice::from_rows(system.lattice)
        .ok_or_else(|| eyre!("Lattice vectors {:?} span no volume", system.lattice))?;

    let mut positions = Vec::with_capacity(system.atoms.len());
    let mut charges = Vec::with_capacity(system.atoms.len());
    for atom in &system.atoms {
        let element = Element::from_symbol(&atom.element)
            .ok_or_else(|| eyre!("Invalid element symbol: {}", atom.element))?;
        let charge = atom
            .charge
            .unwrap_or(element.get_atomic_number() as f64);
        let position = Vector3::new(atom.coords[0], atom.coords[1], atom.coords[2]);
        info!(
            "  {:>2} Z = {:4.1} at [{:10.6}, {:10.6}, {:10.6}] bohr",
            element.get_symbol(),
            charge,
            position.x,
            position.y,
            position.z
        );
        positions.push(position);
        charges.push(charge);
    }

    let occupations = system
        .occupations
        .clone()
        .unwrap_or_else(|| default_occupations(charges.iter().sum()));
    info!("  Occupations: {:?}", occupations);

    AtomicSystem::new(
        lattice,
        positions,
        charges,
        system.ecut,
        system.grid,
        occupations,
    )
    .wrap_err("Invalid system definition")
}
