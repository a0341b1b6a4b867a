use crate::cli::{CountArgs, Selection};
use crate::config::PartialAppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use lemon::{
    core::{
        io::pdb::PdbFile,
        models::{
            residue::{Residue, ResidueKind},
            structure::Structure,
        },
    },
    engine::{
        aggregator::TextSink,
        progress::ProgressReporter,
        worker::{Worker, WorkerError},
    },
    workflows,
};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufWriter, Write};
use std::sync::Mutex;
use tracing::{info, warn};

/// Per-record residue name tally, printed as `id<TAB>NAME count<TAB>NAME count...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueCounts {
    pub id: String,
    pub counts: BTreeMap<String, usize>,
}

impl fmt::Display for ResidueCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        for (name, count) in &self.counts {
            write!(f, "\t{} {}", name, count)?;
        }
        Ok(())
    }
}

fn selects(selection: Selection, residue: &Residue) -> bool {
    match selection {
        Selection::MetalIons => residue.kind == ResidueKind::MetalIon,
        Selection::Waters => residue.kind == ResidueKind::Water,
        Selection::Ligands => residue.hetero && residue.kind == ResidueKind::Other,
    }
}

/// Counts the selected residues of every record and writes a `Total` line on finalize.
pub struct ResidueCounter<W: Write + Send> {
    selection: Selection,
    totals: Mutex<BTreeMap<String, usize>>,
    out: Mutex<W>,
}

impl<W: Write + Send> ResidueCounter<W> {
    pub fn new(selection: Selection, out: W) -> Self {
        Self {
            selection,
            totals: Mutex::new(BTreeMap::new()),
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Worker for ResidueCounter<W> {
    type Output = ResidueCounts;

    fn process(&self, structure: Structure, id: &str) -> std::result::Result<ResidueCounts, WorkerError> {
        let selected = structure.select_residues(|r| selects(self.selection, r));
        let counts = structure.residue_name_counts(selected);

        let mut totals = self
            .totals
            .lock()
            .map_err(|_| "residue totals lock poisoned")?;
        for (name, count) in &counts {
            *totals.entry(name.clone()).or_default() += count;
        }

        Ok(ResidueCounts {
            id: id.to_string(),
            counts,
        })
    }

    fn finalize(&mut self) {
        let totals = ResidueCounts {
            id: "Total".to_string(),
            counts: std::mem::take(
                self.totals
                    .get_mut()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
            ),
        };
        let out = self
            .out
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = writeln!(out, "{totals}").and_then(|_| out.flush()) {
            warn!("Failed to write totals: {}", e);
        }
    }
}

pub fn run(args: CountArgs, show_progress: bool) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialAppConfig::from_file(path)?,
        None => PartialAppConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;
    info!(
        "Counting {:?} with {} pool workers in {}",
        config.selection,
        config.run.worker_count,
        config.run.work_dir.display()
    );

    let progress_handler = show_progress.then(CliProgressHandler::new);
    let reporter = match &progress_handler {
        Some(handler) => ProgressReporter::with_callback(handler.get_callback()),
        None => ProgressReporter::new(),
    };

    let mut worker = ResidueCounter::new(config.selection, io::stdout());
    let stdout = io::stdout();
    let mut sink = TextSink::new(BufWriter::new(stdout.lock()), io::stderr());

    let summary =
        workflows::mine::run::<PdbFile, _, _>(&config.run, &mut worker, &mut sink, &reporter)?;

    info!(
        "Run complete: {} records processed, {} failed.",
        summary.total(),
        summary.failed
    );
    if summary.failed > 0 {
        eprintln!(
            "Warning: {} of {} records failed.",
            summary.failed,
            summary.total()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lemon::core::io::traits::StructureFormat;

    const RECORD: &str = "\
HEADER    METAL BINDING                           01-JAN-00   1ABC
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
HETATM    2 ZN    ZN A 101       5.000   5.000   5.000  1.00 20.00          ZN
HETATM    3 ZN    ZN A 102       6.000   5.000   5.000  1.00 20.00          ZN
HETATM    4 MG    MG A 103       7.000   5.000   5.000  1.00 20.00          MG
HETATM    5  O   HOH A 201       1.000   1.000   1.000  1.00 30.00           O
HETATM    6  C1  ATP A 301       2.000   2.000   2.000  1.00 30.00           C
END
";

    fn structure() -> Structure {
        PdbFile::read_from_bytes(RECORD.as_bytes()).unwrap()
    }

    #[test]
    fn metal_ion_selection_counts_by_name() {
        let counter = ResidueCounter::new(Selection::MetalIons, io::sink());
        let counts = counter.process(structure(), "1ABC").unwrap();
        assert_eq!(counts.to_string(), "1ABC\tMG 1\tZN 2");
    }

    #[test]
    fn water_and_ligand_selections_are_disjoint_from_metals() {
        let waters = ResidueCounter::new(Selection::Waters, io::sink())
            .process(structure(), "1ABC")
            .unwrap();
        assert_eq!(waters.to_string(), "1ABC\tHOH 1");

        let ligands = ResidueCounter::new(Selection::Ligands, io::sink())
            .process(structure(), "1ABC")
            .unwrap();
        assert_eq!(ligands.to_string(), "1ABC\tATP 1");
    }

    #[test]
    fn record_without_selected_residues_prints_only_its_id() {
        let counts = ResidueCounts {
            id: "9XYZ".to_string(),
            counts: BTreeMap::new(),
        };
        assert_eq!(counts.to_string(), "9XYZ");
    }

    #[test]
    fn finalize_writes_accumulated_totals() {
        let mut counter = ResidueCounter::new(Selection::MetalIons, Vec::<u8>::new());
        counter.process(structure(), "1ABC").unwrap();
        counter.process(structure(), "2DEF").unwrap();
        counter.finalize();

        let out = String::from_utf8(counter.into_inner()).unwrap();
        assert_eq!(out, "Total\tMG 2\tZN 4\n");
    }
}
