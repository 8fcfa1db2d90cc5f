//! Test utilities: the fixture files of the tests/resources mini-corpus
use lazy_static::lazy_static;
use walkdir::WalkDir;

/// Directory holding the fixture files
pub const RESOURCES_DIR: &str = "./tests/resources";

lazy_static! { // preload a list of the fixtures we have for testing, for easy format sanity checks
  ///  shorthand global for the file names of every fixture, sorted
  pub static ref RESOURCE_FILES: Vec<String> = {
    let mut names: Vec<String> = WalkDir::new(RESOURCES_DIR)
      .into_iter()
      .filter_map(|e| e.ok())
      .filter(|e| !e.file_type().is_dir())
      .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
      .collect();
    names.sort();
    names
  };
}

/// Path of the fixture called `name`
pub fn resource(name: &str) -> String { format!("{}/{}", RESOURCES_DIR, name) }

/// The fixtures whose name ends with `suffix`, as paths
pub fn resources_with_suffix(suffix: &str) -> Vec<String> {
  RESOURCE_FILES
    .iter()
    .filter(|name| name.ends_with(suffix))
    .map(|name| resource(name))
    .collect()
}
