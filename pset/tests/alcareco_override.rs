//! Copy-then-override scenarios on output definitions, built in code and
//! loaded from the sample fragments.

use std::path::PathBuf;

use pset::core::error::ConfigError;
use pset::core::module::ModuleDescriptor;
use pset::core::pset::ParameterSet;
use pset::core::render::resolve;
use pset::core::value::{Entry, Value};
use pset::io::cfg_store::load_process_file;

fn sample(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../configs")
        .join(name)
}

fn commands(set: &ParameterSet) -> Vec<String> {
    set.vstring_at("outputCommands")
        .expect("outputCommands")
        .to_vec()
}

#[test]
fn prepending_drop_leaves_baseline_untouched() {
    let baseline = ParameterSet::from_entries([(
        "outputCommands",
        Entry::untracked(Value::vstring(["keep *_foo_*_*"])),
    )])
    .expect("baseline");
    let rendered_before = resolve(&baseline);

    let mut variant = baseline.deep_copy();
    variant
        .insert_sequence_element("outputCommands", 0, "drop *")
        .expect("prepend");

    assert_eq!(commands(&variant), vec!["drop *", "keep *_foo_*_*"]);
    assert_eq!(commands(&baseline), vec!["keep *_foo_*_*"]);
    assert_eq!(resolve(&baseline), rendered_before);
}

#[test]
fn sample_fragment_variants_differ_by_one_drop() {
    let fragment = load_process_file(&sample("ALCARECOTkAlZMuMuHI_Output.cff")).expect("load");
    assert!(fragment.is_fragment());

    let no_drop = fragment
        .pset("OutALCARECOTkAlZMuMuHI_noDrop")
        .expect("noDrop");
    let mut derived = no_drop.deep_copy();
    derived
        .insert_sequence_element("outputCommands", 0, "drop *")
        .expect("prepend");

    let declared = fragment
        .pset("OutALCARECOTkAlZMuMuHI")
        .expect("with drop");
    assert_eq!(&derived, declared);
    assert_eq!(commands(no_drop).len() + 1, commands(declared).len());
}

#[test]
fn output_module_built_from_template_keeps_template() {
    let fragment = load_process_file(&sample("ALCARECOTkAlZMuMuHI_Output.cff")).expect("load");
    let template = fragment
        .pset("OutALCARECOTkAlZMuMuHI")
        .expect("template")
        .clone();

    let base = ModuleDescriptor::output("PoolOutputModule", template.deep_copy());
    let overrides = ParameterSet::from_entries([(
        "fileName",
        Entry::untracked(Value::string("ALCARECOTkAlZMuMuHI.root")),
    )])
    .expect("overrides");
    let module = base.clone_with(overrides);

    assert_eq!(module.selected_paths(), vec!["pathALCARECOTkAlZMuMuHI"]);
    assert!(base.params.get("fileName").is_none());
    assert_eq!(
        module.params.str_at("fileName").expect("fileName"),
        "ALCARECOTkAlZMuMuHI.root"
    );
    assert_eq!(&base.params, &template);
}

#[test]
fn inserting_past_the_end_is_rejected() {
    let fragment = load_process_file(&sample("ALCARECOTkAlZMuMuHI_Output.cff")).expect("load");
    let mut set = fragment
        .pset("OutALCARECOTkAlZMuMuHI_noDrop")
        .expect("noDrop")
        .deep_copy();
    let len = commands(&set).len();
    let before = set.clone();

    let err = set
        .insert_sequence_element("outputCommands", len + 1, "drop *")
        .expect_err("past end");
    assert_eq!(
        err,
        ConfigError::IndexOutOfRange {
            path: "outputCommands".to_string(),
            index: len + 1,
            len,
        }
    );
    assert_eq!(set, before);
}
