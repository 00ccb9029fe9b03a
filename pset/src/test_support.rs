//! Test-only fixtures: parameter sets and processes modelled on real
//! configurations, plus a scratch directory for file-based tests.

use crate::core::input_tag::InputTag;
use crate::core::module::{ModuleDescriptor, PathDef, PathKind};
use crate::core::process::Process;
use crate::core::pset::ParameterSet;
use crate::core::value::{Entry, Value};

fn set<const N: usize>(entries: [(&str, Entry); N]) -> ParameterSet {
    ParameterSet::from_entries(entries).expect("fixture names are unique")
}

/// Output-module baseline for an ALCARECO stream: an untracked event gate
/// and the list of products to keep.
pub fn alcareco_baseline() -> ParameterSet {
    set([
        (
            "SelectEvents",
            Entry::untracked(Value::PSet(set([(
                "SelectEvents",
                Entry::tracked(Value::vstring(["pathALCARECOTkAlZMuMuHI"])),
            )]))),
        ),
        (
            "outputCommands",
            Entry::untracked(Value::vstring([
                "keep *_ALCARECOTkAlZMuMuHI_*_*",
                "keep L1AcceptBunchCrossings_*_*_*",
                "keep L1GlobalTriggerReadoutRecord_gtDigis_*_*",
                "keep *_TriggerResults_*_*",
                "keep DcsStatuss_scalersRawToDigi_*_*",
                "keep *_offlinePrimaryVertices_*_*",
            ])),
        ),
    ])
}

/// A process whose output module is gated on a path it defines.
pub fn alcareco_process() -> Process {
    let mut process = Process::new("ALCA");
    process
        .add_module(
            "ALCARECOTkAlZMuMuHI",
            ModuleDescriptor::filter("AlignmentTrackSelectorModule", ParameterSet::new()),
        )
        .expect("filter");
    process
        .add_module(
            "ALCARECOStreamTkAlZMuMuHI",
            ModuleDescriptor::output("PoolOutputModule", alcareco_baseline()),
        )
        .expect("output");
    process
        .add_path(PathDef::new(
            PathKind::Path,
            "pathALCARECOTkAlZMuMuHI",
            ["ALCARECOTkAlZMuMuHI"],
        ))
        .expect("path");
    process
        .add_path(PathDef::new(
            PathKind::EndPath,
            "ALCARECOStreamTkAlZMuMuHIOutPath",
            ["ALCARECOStreamTkAlZMuMuHI"],
        ))
        .expect("endpath");
    process
}

fn rechit_creator(name: &str, instance: &str) -> ParameterSet {
    set([
        ("name", Entry::tracked(Value::string(name))),
        (
            "src",
            Entry::tracked(Value::input_tag(
                InputTag::with_instance("ecalRecHit", instance).expect("src tag"),
            )),
        ),
        (
            "srFlags",
            Entry::tracked(Value::input_tag(InputTag::default())),
        ),
        (
            "qualityTests",
            Entry::tracked(Value::VPSet(vec![
                set([
                    ("name", Entry::tracked(Value::string("PFRecHitQTestDBThreshold"))),
                    ("applySelectionsToAllCrystals", Entry::tracked(Value::Bool(true))),
                ]),
                set([
                    ("name", Entry::tracked(Value::string("PFRecHitQTestECAL"))),
                    ("cleaningThreshold", Entry::tracked(Value::Double(2.0))),
                    ("timingCleaning", Entry::tracked(Value::Bool(true))),
                    ("topologicalCleaning", Entry::tracked(Value::Bool(true))),
                    ("skipTTRecoveredHits", Entry::tracked(Value::Bool(true))),
                ]),
            ])),
        ),
    ])
}

/// ECAL rec-hit producer parameters: a navigator with barrel/endcap blocks
/// and one creator per subdetector, each with its own quality tests.
pub fn pf_rechit_ecal_params() -> ParameterSet {
    set([
        (
            "navigator",
            Entry::tracked(Value::PSet(set([
                ("name", Entry::tracked(Value::string("PFRecHitECALNavigator"))),
                ("barrel", Entry::tracked(Value::PSet(ParameterSet::new()))),
                ("endcap", Entry::tracked(Value::PSet(ParameterSet::new()))),
            ]))),
        ),
        (
            "producers",
            Entry::tracked(Value::VPSet(vec![
                rechit_creator("PFEBRecHitCreator", "EcalRecHitsEB"),
                rechit_creator("PFEERecHitCreator", "EcalRecHitsEE"),
            ])),
        ),
    ])
}

/// Streamer-file read-back job: options, a source, one analyzer and one
/// output module on a single endpath.
pub fn stream_transfer_process() -> Process {
    let mut process = Process::new("TRANSFER");
    process
        .add_pset(
            "options",
            set([("wantSummary", Entry::untracked(Value::Bool(false)))]),
        )
        .expect("options");
    process
        .set_source(ModuleDescriptor::source(
            "NewEventStreamFileReader",
            set([
                (
                    "fileNames",
                    Entry::untracked(Value::vstring(["file:teststreamfile.dat"])),
                ),
                (
                    "inputFileTransitionsEachEvent",
                    Entry::untracked(Value::Bool(true)),
                ),
            ]),
        ))
        .expect("source");
    process
        .add_module(
            "a1",
            ModuleDescriptor::analyzer(
                "StreamThingAnalyzer",
                set([("product_to_get", Entry::tracked(Value::string("m1")))]),
            ),
        )
        .expect("a1");
    process
        .add_module(
            "out",
            ModuleDescriptor::output(
                "PoolOutputModule",
                set([("fileName", Entry::untracked(Value::string("myout11.root")))]),
            ),
        )
        .expect("out");
    process
        .add_path(PathDef::new(PathKind::EndPath, "end", ["a1", "out"]))
        .expect("end");
    process
}

/// A headerless fragment registering the message-logger service block.
pub fn message_logger_fragment() -> Process {
    let mut fragment = Process::fragment();
    fragment
        .add_pset(
            "MessageLogger",
            set([
                (
                    "cerr",
                    Entry::untracked(Value::PSet(set([(
                        "threshold",
                        Entry::untracked(Value::string("INFO")),
                    )]))),
                ),
                (
                    "destinations",
                    Entry::untracked(Value::vstring(["cerr"])),
                ),
            ]),
        )
        .expect("MessageLogger");
    fragment
}

#[cfg(feature = "test-support")]
mod scratch {
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Scratch directory that is removed on drop.
    pub struct ScratchDir {
        dir: tempfile::TempDir,
    }

    impl ScratchDir {
        pub fn new() -> Self {
            Self {
                dir: tempfile::tempdir().expect("tempdir"),
            }
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }

        /// Write `contents` to `relative`, creating parent directories.
        pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
            let path = self.dir.path().join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create parent");
            }
            fs::write(&path, contents).expect("write fixture");
            path
        }

        pub fn read(&self, relative: &str) -> String {
            fs::read_to_string(self.dir.path().join(relative)).expect("read fixture")
        }
    }

    impl Default for ScratchDir {
        fn default() -> Self {
            Self::new()
        }
    }
}

#[cfg(feature = "test-support")]
pub use scratch::ScratchDir;
