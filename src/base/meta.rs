//! The header declaring corpus sizes, feature types and TP classes of a stream
use super::feature::{FeatValue, FeatureSet};
use super::quoteattr;

/// Declaration of a feature or TP class: a name and a WEKA-style type
#[derive(Debug, Clone, PartialEq)]
pub struct MetaFeat {
  /// feature name
  pub name: String,
  /// `integer`, `real`, `string` or an enumeration like `{True,False}`
  pub feat_type: String,
}

impl MetaFeat {
  /// A new declaration
  pub fn new(name: &str, feat_type: &str) -> Self {
    MetaFeat {
      name: name.to_string(),
      feat_type: feat_type.to_string(),
    }
  }

  fn to_xml(&self, tag: &str) -> String {
    format!("<{} name={} type={} />", tag, quoteattr(&self.name), quoteattr(&self.feat_type))
  }
}

/// The meta header of a candidate list or corpus
#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
  /// corpus name to number of tokens; the last value wins
  pub corpus_sizes: FeatureSet<i64>,
  /// feature declarations
  pub meta_feats: Vec<MetaFeat>,
  /// TP class declarations
  pub meta_tpclasses: Vec<MetaFeat>,
}

impl Default for Meta {
  fn default() -> Meta {
    Meta {
      corpus_sizes: FeatureSet::corpus_sizes(),
      meta_feats: Vec::new(),
      meta_tpclasses: Vec::new(),
    }
  }
}

impl Meta {
  /// An empty header
  pub fn new() -> Self { Meta::default() }

  /// Whether nothing is declared at all
  pub fn is_dummy(&self) -> bool {
    self.corpus_sizes.is_empty() && self.meta_feats.is_empty() && self.meta_tpclasses.is_empty()
  }

  /// Declares the size of a corpus
  pub fn add_corpus_size(&mut self, name: &str, size: i64) { self.corpus_sizes.add(name, size); }

  /// Size of corpus `name`
  pub fn get_corpus_size(&self, name: &str) -> Option<i64> { self.corpus_sizes.get(name).cloned() }

  /// Declares a feature
  pub fn add_meta_feat(&mut self, name: &str, feat_type: &str) {
    self.meta_feats.push(MetaFeat::new(name, feat_type));
  }

  /// Declares a TP class
  pub fn add_meta_tpclass(&mut self, name: &str, feat_type: &str) {
    self.meta_tpclasses.push(MetaFeat::new(name, feat_type));
  }

  /// Declared type of feature `name`
  pub fn get_feat_type(&self, name: &str) -> Option<&str> {
    self
      .meta_feats
      .iter()
      .find(|f| f.name == name)
      .map(|f| f.feat_type.as_str())
  }

  /// Parses a raw feature value according to its declaration
  pub fn typed_value(&self, name: &str, raw: &str) -> FeatValue {
    FeatValue::typed(raw, self.get_feat_type(name))
  }

  /// Folds a later header into this one: corpus sizes are replaced,
  /// declarations are united, and a conflicting type keeps the first one with a warning
  pub fn merge_from(&mut self, other: &Meta) {
    for (name, size) in other.corpus_sizes.iter() {
      self.corpus_sizes.set(name, *size);
    }
    fn unite(mine: &mut Vec<MetaFeat>, theirs: &[MetaFeat]) {
      for feat in theirs {
        match mine.iter().find(|f| f.name == feat.name) {
          Some(existing) => {
            if existing.feat_type != feat.feat_type {
              warn_once!(
                "Conflicting declarations for {:?}: {} and {}; keeping {}",
                feat.name,
                existing.feat_type,
                feat.feat_type,
                existing.feat_type
              );
            }
          },
          None => mine.push(feat.clone()),
        }
      }
    }
    unite(&mut self.meta_feats, &other.meta_feats);
    unite(&mut self.meta_tpclasses, &other.meta_tpclasses);
  }

  /// The `<meta>` element
  pub fn to_xml(&self) -> String {
    let mut output = String::from("<meta>\n");
    self.corpus_sizes.to_xml_into(&mut output, 4, "\n");
    for feat in &self.meta_feats {
      output.push_str("    ");
      output.push_str(&feat.to_xml("metafeat"));
      output.push('\n');
    }
    for tpclass in &self.meta_tpclasses {
      output.push_str("    ");
      output.push_str(&tpclass.to_xml("metatpclass"));
      output.push('\n');
    }
    output.push_str("</meta>");
    output
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dummy_until_something_is_declared() {
    let mut meta = Meta::new();
    assert!(meta.is_dummy());
    meta.add_corpus_size("bnc", 100);
    assert!(!meta.is_dummy());
  }

  #[test]
  fn later_headers_replace_sizes_and_unite_declarations() {
    let mut meta = Meta::new();
    meta.add_corpus_size("bnc", 100);
    meta.add_meta_feat("pmi_bnc", "real");
    let mut later = Meta::new();
    later.add_corpus_size("bnc", 50);
    later.add_corpus_size("web", 7);
    later.add_meta_feat("pmi_bnc", "integer");
    later.add_meta_feat("t_bnc", "real");
    meta.merge_from(&later);
    assert_eq!(meta.get_corpus_size("bnc"), Some(50));
    assert_eq!(meta.get_corpus_size("web"), Some(7));
    assert_eq!(meta.get_feat_type("pmi_bnc"), Some("real"));
    assert_eq!(meta.get_feat_type("t_bnc"), Some("real"));
  }

  #[test]
  fn xml_layout() {
    let mut meta = Meta::new();
    meta.add_corpus_size("bnc", 100);
    meta.add_meta_feat("pmi_bnc", "real");
    meta.add_meta_tpclass("gold", "{True,False}");
    assert_eq!(
      meta.to_xml(),
      "<meta>\n    <corpussize name=\"bnc\" value=\"100\" />\n    <metafeat name=\"pmi_bnc\" type=\"real\" />\n    \
       <metatpclass name=\"gold\" type=\"{True,False}\" />\n</meta>"
    );
  }

  #[test]
  fn values_follow_declarations() {
    let mut meta = Meta::new();
    meta.add_meta_feat("n", "integer");
    assert_eq!(meta.typed_value("n", "4"), FeatValue::Int(4));
    assert_eq!(meta.typed_value("other", "4"), FeatValue::Str("4".into()));
  }
}
