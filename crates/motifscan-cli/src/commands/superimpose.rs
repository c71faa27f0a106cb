use super::load_motif;
use crate::cli::SuperimposeArgs;
use crate::config::defaults::DefaultsConfig;
use crate::error::Result;
use crate::output;
use motifscan::core::geometry::Alignment;
use motifscan::engine::tasks::rmsd_matrix::motif_alignment;
use tracing::info;

pub fn run(args: SuperimposeArgs) -> Result<()> {
    let reference = load_motif(&args.reference, args.reference_residues.as_deref())?;
    let candidate = load_motif(&args.candidate, args.candidate_residues.as_deref())?;
    let atoms = args.atoms.unwrap_or(DefaultsConfig::default().search_atoms);

    info!(
        "Superimposing '{}' onto '{}' using {} atoms.",
        candidate.label(),
        reference.label(),
        atoms
    );
    let alignment = motif_alignment(&reference, &candidate, &atoms)?;

    print!("{}", describe(&alignment));

    if let Some(path) = &args.output {
        let moved = candidate.transformed(&alignment);
        output::write_residues(moved.residues(), path)?;
        println!("Transformed candidate written to: {}", path.display());
    }
    Ok(())
}

/// Human-readable RMSD, rotation rows and translation.
fn describe(alignment: &Alignment) -> String {
    let rotation = alignment.rotation().matrix();
    let translation = alignment.translation();
    let mut text = format!("RMSD: {:.4} Å\nRotation:\n", alignment.rmsd());
    for row in 0..3 {
        text.push_str(&format!(
            "  {:>9.5} {:>9.5} {:>9.5}\n",
            rotation[(row, 0)],
            rotation[(row, 1)],
            rotation[(row, 2)]
        ));
    }
    text.push_str(&format!(
        "Translation:\n  {:>9.4} {:>9.4} {:>9.4}\n",
        translation.x, translation.y, translation.z
    ));
    text
}
