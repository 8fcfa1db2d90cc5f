//! The toolkit's own XML format: `<corpus>`, `<candidates>`, `<dict>` and `<patterns>` documents.
//!
//! Input is read into a libxml DOM and walked element by element. Comments
//! before the root and directly inside it are delivered as comments, or as
//! directives when they hold one.
use libxml::parser::Parser as XmlParser;
use libxml::tree::{Document, Node};
use log::warn;
use std::io::{Read, Write};

use super::common::{ParsingContext, PrinterCore};
use super::handler::{Entity, InputHandler};
use super::input::InputFile;
use super::{Category, FiletypeInfo, ParseInfo, ParseOptions, Parser};
use crate::base::{Candidate, CandidateFactory, Entry, Meta, Ngram, Sentence, SentenceFactory, Word};
use crate::error::{Error, Result};
use crate::patterns::utils::{get_children as children, is_comment_node, is_element_node};
use crate::patterns::ParsedPattern;

/// XML description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "XML",
  description: "An XML in mwetoolkit format (dtd/mwetoolkit-*.dtd)",
  comment_prefix: "#",
  escape_pairs: &[],
  checker: check,
  parser: Some(new_parser),
  printer: Some(new_printer),
  input_categories: &[Category::Corpus, Category::Candidates, Category::Dict, Category::Patterns],
  output_categories: &[Category::Corpus, Category::Candidates, Category::Dict, Category::Patterns],
};

const BOM: &[u8] = b"\xef\xbb\xbf";

fn check(header: &[u8], _strict: bool) -> bool {
  let header = if header.starts_with(BOM) { &header[BOM.len()..] } else { header };
  header.starts_with(b"<?xml") || header.starts_with(b"<pattern") || header.starts_with(b"<!--")
}

fn new_parser(_options: &ParseOptions) -> Box<dyn Parser> { Box::new(XmlFileParser) }

fn new_printer(category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  Ok(Box::new(XmlPrinter {
    core: PrinterCore::new(&INFO, category, output)?,
    category,
  }))
}

/*
 * XML HELPER FUNCTIONS
 */

/// Gets a property from a node, or an input error if it doesn't have it
fn require_property(ctx: &ParsingContext, node: &Node, property: &str) -> Result<String> {
  node.get_property(property).ok_or_else(|| {
    ctx.input_error(format!("\"{}\" node misses \"{}\" property", node.get_name(), property))
  })
}

fn int_property(ctx: &ParsingContext, node: &Node, property: &str) -> Result<Option<i64>> {
  match node.get_property(property) {
    None => Ok(None),
    Some(value) => match value.trim().parse() {
      Ok(number) => Ok(Some(number)),
      Err(_) => Err(ctx.input_error(format!(
        "\"{}\" property of \"{}\" node is not an integer: {:?}",
        property,
        node.get_name(),
        value
      ))),
    },
  }
}

fn id_property(ctx: &ParsingContext, node: &Node, property: &str) -> Result<Option<u64>> {
  match int_property(ctx, node, property)? {
    Some(id) if id < 0 => Err(ctx.input_error(format!("Negative {}: {}", property, id))),
    other => Ok(other.map(|id| id as u64)),
  }
}

fn ignore_unknown(node: &Node) {
  warn!("Ignoring unknown XML elem: {:?}", node.get_name());
}

/// Reads a whole document and dispatches on its root element
struct XmlFileParser;

/// Per-document state
struct DocumentWalker<'d> {
  doc: &'d Document,
  meta: Meta,
  sentences: SentenceFactory,
  candidates: CandidateFactory,
  next_entry_id: u64,
}

/// Reads the whole input into a DOM, and finds the category from the root element
fn load_document(input: &mut InputFile, filename: &str) -> Result<(Document, Category)> {
  let mut bytes = Vec::new();
  input.reader().read_to_end(&mut bytes)?;
  let content = String::from_utf8_lossy(&bytes);
  let content = content.trim_start_matches('\u{feff}');
  if !content.starts_with("<?xml") {
    if content.contains("\n<?xml") {
      return Err(Error::input(filename, None, "XML tag <?xml> cannot appear after first line!"));
    }
    warn!("XML file should start with <?xml> tag!");
  }
  let doc = XmlParser::default()
    .parse_string(content)
    .map_err(|err| Error::Xml(format!("Failed to obtain DOM from {}: {:?}", filename, err)))?;
  let root_name = match doc.get_root_element() {
    Some(root) => root.get_name(),
    None => return Err(Error::input(filename, None, "XML document has no root element")),
  };
  let category = match root_name.as_str() {
    "corpus" => Category::Corpus,
    "candidates" => Category::Candidates,
    "dict" => Category::Dict,
    "patterns" => Category::Patterns,
    other => return Err(Error::input(filename, None, format!("Bad top-level XML elem: {:?}", other))),
  };
  Ok((doc, category))
}

impl Parser for XmlFileParser {
  fn parse_file(&mut self, input: &mut InputFile, handler: &mut dyn InputHandler, mut info: ParseInfo) -> Result<()> {
    let loaded = load_document(input, &info.filename);
    if let Ok((_, category)) = &loaded {
      info.category = *category;
    }
    info.progress = input.progress();
    ParsingContext::run(handler, info, |ctx| {
      let (doc, _) = loaded?;
      let root = doc
        .get_root_element()
        .ok_or_else(|| ctx.input_error("XML document has no root element"))?;
      let mut walker = DocumentWalker {
        doc: &doc,
        meta: Meta::new(),
        sentences: SentenceFactory::new(),
        candidates: CandidateFactory::new(),
        next_entry_id: 1,
      };
      walker.walk(ctx, &root)
    })
  }
}

impl<'d> DocumentWalker<'d> {
  fn walk(&mut self, ctx: &mut ParsingContext, root: &Node) -> Result<()> {
    let mut leading = Vec::new();
    let mut cur = root.get_prev_sibling();
    while let Some(node) = cur {
      cur = node.get_prev_sibling();
      leading.push(node);
    }
    for node in leading.iter().rev().filter(|n| is_comment_node(n)) {
      ctx.handle_comment_line(&node.get_content())?;
    }

    let category = ctx.info.category;

    for child in children(root) {
      if is_comment_node(&child) {
        ctx.handle_comment_line(&child.get_content())?;
        continue;
      }
      if !is_element_node(&child) {
        continue;
      }
      match (category, child.get_name().as_str()) {
        (Category::Corpus, "s") => {
          let sentence = self.sentence(ctx, &child)?;
          ctx.emit(Entity::Sentence(sentence))?;
        },
        (Category::Candidates, "meta") | (Category::Dict, "meta") => {
          self.meta = self.meta_of(ctx, &child)?;
          ctx.emit(Entity::Meta(self.meta.clone()))?;
        },
        (Category::Candidates, "cand") => {
          let candidate = self.candidate(ctx, &child)?;
          ctx.emit(Entity::Candidate(candidate))?;
        },
        (Category::Dict, "entry") => {
          let entry = self.entry(ctx, &child)?;
          ctx.emit(Entity::Candidate(entry.into_candidate()))?;
        },
        (Category::Patterns, "pat") => {
          let pattern = ParsedPattern::from_node(self.doc, &child)?;
          ctx.emit(Entity::Pattern(pattern))?;
        },
        _ => ignore_unknown(&child),
      }
    }

    let mut cur = root.get_next_sibling();
    while let Some(node) = cur {
      cur = node.get_next_sibling();
      if is_comment_node(&node) {
        ctx.handle_comment_line(&node.get_content())?;
      }
    }
    Ok(())
  }

  /// A `<w>` element, with its `<freq>` children
  fn word(&self, ctx: &ParsingContext, node: &Node) -> Result<Word> {
    let surface = node.get_property("surface");
    let lemma = node.get_property("lemma");
    let pos = node.get_property("pos");
    let syn = node.get_property("syn");
    let mut word = Word::checked(surface.as_deref(), lemma.as_deref(), pos.as_deref(), syn.as_deref())?;
    for child in children(node).iter().filter(|c| is_element_node(c)) {
      match child.get_name().as_str() {
        "freq" => {
          let (name, value) = self.freq(ctx, child)?;
          word.add_frequency(&name, value);
        },
        _ => ignore_unknown(child),
      }
    }
    Ok(word)
  }

  fn freq(&self, ctx: &ParsingContext, node: &Node) -> Result<(String, i64)> {
    let name = require_property(ctx, node, "name")?;
    let value = match int_property(ctx, node, "value")? {
      Some(value) => value,
      None => return Err(ctx.input_error("\"freq\" node misses \"value\" property")),
    };
    Ok((name, value))
  }

  fn sentence(&mut self, ctx: &ParsingContext, node: &Node) -> Result<Sentence> {
    let id = id_property(ctx, node, "s_id")?;
    let mut sentence = self.sentences.make(Vec::new(), id);
    let mut occurrences = Vec::new();
    for child in children(node).iter().filter(|c| is_element_node(c)) {
      match child.get_name().as_str() {
        "w" => sentence.words.push(self.word(ctx, child)?),
        "mweoccurs" => {
          for occur in children(child).iter().filter(|c| is_element_node(c)) {
            if occur.get_name() != "mweoccur" {
              ignore_unknown(occur);
              continue;
            }
            let candid = id_property(ctx, occur, "candid")?.unwrap_or(0);
            let mut indexes = Vec::new();
            for part in children(occur).iter().filter(|c| is_element_node(c) && c.get_name() == "mwepart") {
              let index = int_property(ctx, part, "index")?.unwrap_or(0);
              if index < 1 {
                return Err(Error::BadIndex {
                  candidate: candid,
                  sentence: sentence.id_number,
                  index: 0,
                });
              }
              indexes.push(index as usize - 1);
            }
            occurrences.push((candid, indexes));
          }
        },
        _ => ignore_unknown(child),
      }
    }
    for (candid, indexes) in occurrences {
      sentence.annotate_span(candid, indexes)?;
    }
    Ok(sentence)
  }

  fn meta_of(&self, ctx: &ParsingContext, node: &Node) -> Result<Meta> {
    let mut meta = Meta::new();
    for child in children(node).iter().filter(|c| is_element_node(c)) {
      match child.get_name().as_str() {
        "corpussize" => {
          let name = require_property(ctx, child, "name")?;
          let value = int_property(ctx, child, "value")?.unwrap_or(0);
          meta.add_corpus_size(&name, value);
        },
        "metafeat" => {
          let name = require_property(ctx, child, "name")?;
          meta.add_meta_feat(&name, &require_property(ctx, child, "type")?);
        },
        "metatpclass" => {
          let name = require_property(ctx, child, "name")?;
          meta.add_meta_tpclass(&name, &require_property(ctx, child, "type")?);
        },
        _ => ignore_unknown(child),
      }
    }
    Ok(meta)
  }

  /// An `<ngram>` element: words, frequencies and sources
  fn ngram(&self, ctx: &ParsingContext, node: &Node) -> Result<Ngram> {
    let mut ngram = Ngram::default();
    for child in children(node).iter().filter(|c| is_element_node(c)) {
      match child.get_name().as_str() {
        "w" => ngram.words.push(self.word(ctx, child)?),
        "freq" => {
          let (name, value) = self.freq(ctx, child)?;
          ngram.add_frequency(&name, value);
        },
        "sources" => {
          let ids = require_property(ctx, child, "ids")?;
          ngram.sources.extend(ids.split(';').filter(|s| !s.is_empty()).map(str::to_string));
        },
        _ => ignore_unknown(child),
      }
    }
    Ok(ngram)
  }

  /// The `<ngram>` children of a wrapper such as `<occurs>`
  fn ngrams(&self, ctx: &ParsingContext, node: &Node) -> Result<Vec<Ngram>> {
    let mut ngrams = Vec::new();
    for child in children(node).iter().filter(|c| is_element_node(c)) {
      if child.get_name() == "ngram" {
        ngrams.push(self.ngram(ctx, child)?);
      } else {
        ignore_unknown(child);
      }
    }
    Ok(ngrams)
  }

  /// `<feat>` elements, typed after the last meta header
  fn features(&self, ctx: &ParsingContext, node: &Node, candidate: &mut Candidate) -> Result<()> {
    for feat in children(node).iter().filter(|c| is_element_node(c)) {
      if feat.get_name() != "feat" {
        ignore_unknown(feat);
        continue;
      }
      let name = require_property(ctx, feat, "name")?;
      let raw = require_property(ctx, feat, "value")?;
      candidate.add_feat(&name, self.meta.typed_value(&name, &raw));
    }
    Ok(())
  }

  fn candidate(&mut self, ctx: &ParsingContext, node: &Node) -> Result<Candidate> {
    let id = id_property(ctx, node, "candid")?;
    let mut candidate = self.candidates.make(Vec::new(), id);
    for child in children(node).iter().filter(|c| is_element_node(c)) {
      match child.get_name().as_str() {
        "ngram" => candidate.ngram = self.ngram(ctx, child)?,
        "bigram" | "bigrams" => candidate.bigrams.extend(self.ngrams(ctx, child)?),
        "occurs" => candidate.occurs.extend(self.ngrams(ctx, child)?),
        "vars" => candidate.vars.extend(self.ngrams(ctx, child)?),
        "features" => self.features(ctx, child, &mut candidate)?,
        "tpclass" => {
          let name = require_property(ctx, child, "name")?;
          candidate.tpclasses.add(&name, require_property(ctx, child, "value")?);
        },
        _ => ignore_unknown(child),
      }
    }
    Ok(candidate)
  }

  fn entry(&mut self, ctx: &ParsingContext, node: &Node) -> Result<Entry> {
    if let Some(id) = id_property(ctx, node, "entryid")? {
      self.next_entry_id = id;
    }
    let mut candidate = Candidate::new(self.next_entry_id, Vec::new());
    self.next_entry_id += 1;
    for child in children(node).iter().filter(|c| is_element_node(c)) {
      match child.get_name().as_str() {
        "w" => candidate.ngram.words.push(self.word(ctx, child)?),
        "freq" => {
          let (name, value) = self.freq(ctx, child)?;
          candidate.ngram.add_frequency(&name, value);
        },
        "features" => self.features(ctx, child, &mut candidate)?,
        _ => ignore_unknown(child),
      }
    }
    Ok(Entry::from(&candidate))
  }
}

/// Header of a document of `category`, with the filetype directive
pub fn xml_header(category: Category) -> String {
  format!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
     <!DOCTYPE {cat} SYSTEM \"dtd/mwetoolkit-{cat}.dtd\">\n\
     <!-- MWETOOLKIT: filetype=\"XML\" -->\n\
     <{cat} >\n",
    cat = category.name()
  )
}

struct XmlPrinter {
  core: PrinterCore,
  category: Category,
}

impl XmlPrinter {
  /// Writes the header the first time only
  fn ensure_header(&mut self) -> Result<()> {
    if self.core.take_directive().is_some() {
      let header = xml_header(self.category);
      self.core.add_string(&header)?;
    }
    Ok(())
  }

  fn add_element(&mut self, xml: &str) -> Result<()> {
    self.ensure_header()?;
    self.core.add_string(xml)?;
    self.core.add_string("\n")
  }
}

impl InputHandler for XmlPrinter {
  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> { self.ensure_header() }

  fn finish(&mut self) -> Result<()> {
    self.ensure_header()?;
    let footer = format!("</{}>\n", self.category.name());
    self.core.add_string(&footer)?;
    self.core.flush()
  }

  fn flush(&mut self) -> Result<()> { self.core.flush() }

  fn handle_comment(&mut self, comment: &str, _info: &ParseInfo) -> Result<()> {
    let text = format!("<!-- {} -->", comment.replace("--", "- -"));
    self.add_element(&text)
  }

  fn handle_directive(&mut self, directive: &super::Directive, info: &ParseInfo) -> Result<()> {
    if directive.key == "filetype" {
      return self.ensure_header();
    }
    self.handle_comment(&directive.to_string(), info)
  }

  /// Only candidate lists and dictionaries carry a meta header
  fn handle_meta(&mut self, meta: Meta, _info: &ParseInfo) -> Result<()> {
    match self.category {
      Category::Candidates | Category::Dict => self.add_element(&meta.to_xml()),
      _ => self.ensure_header(),
    }
  }

  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    self.add_element(&sentence.to_xml())
  }

  fn handle_candidate(&mut self, candidate: Candidate, _info: &ParseInfo) -> Result<()> {
    match self.category {
      Category::Dict => self.add_element(&Entry::from(&candidate).to_xml()),
      _ => self.add_element(&candidate.to_xml()),
    }
  }

  fn handle_pattern(&mut self, pattern: ParsedPattern, _info: &ParseInfo) -> Result<()> {
    self.add_element(&pattern.source)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::filetype::{parse_inputs, EntityCollectorHandler, ParseOptions};

  fn collect(xml: &str) -> EntityCollectorHandler {
    let input = InputFile::from_bytes("test.xml", xml.as_bytes()).unwrap();
    let mut collector = EntityCollectorHandler::new();
    parse_inputs(vec![input], &mut collector, &ParseOptions::default()).unwrap();
    collector
  }

  #[test]
  fn header_detection() {
    assert!(check(b"<?xml version=\"1.0\"?>", true));
    assert!(check(b"\xef\xbb\xbf<?xml version=\"1.0\"?>", true));
    assert!(check(b"<!-- c -->\n<corpus>", true));
    assert!(!check(b"the cat", false));
  }

  #[test]
  fn corpus_sentences_keep_their_occurrences() {
    let collector = collect(
      "<?xml version=\"1.0\"?>\n<corpus>\n<s s_id=\"4\"><w surface=\"Cats\" lemma=\"cat\" pos=\"N\" /> \
       <w surface=\"purr\" /><mweoccurs><mweoccur candid=\"9\"><mwepart index=\"1\"/>\
       <mwepart index=\"2\"/></mweoccur></mweoccurs></s>\n</corpus>\n",
    );
    let sentences = collector.sentences();
    assert_eq!(sentences.len(), 1);
    assert_eq!(sentences[0].id_number, 4);
    assert_eq!(sentences[0].words[0].lemma.as_deref(), Some("cat"));
    assert_eq!(sentences[0].words[1].pos, None);
    assert_eq!(sentences[0].mweoccurs[0].indexes, vec![0, 1]);
    assert_eq!(sentences[0].mweoccurs[0].candidate.id_number, 9);
  }

  #[test]
  fn features_are_typed_by_meta() {
    let collector = collect(
      "<?xml version=\"1.0\"?>\n<candidates>\n<meta><corpussize name=\"bnc\" value=\"100\"/>\
       <metafeat name=\"pmi\" type=\"real\"/></meta>\n<cand candid=\"2\"><ngram><w lemma=\"a\"/>\
       <freq name=\"bnc\" value=\"3\"/></ngram><occurs><ngram><w surface=\"A\"/>\
       <sources ids=\"1:1;2:1\"/></ngram></occurs><features><feat name=\"pmi\" value=\"1.5\"/>\
       </features><tpclass name=\"gold\" value=\"True\"/></cand>\n</candidates>\n",
    );
    let candidates = collector.candidates();
    assert_eq!(candidates.len(), 1);
    let cand = candidates[0];
    assert_eq!(cand.id_number, 2);
    assert_eq!(cand.ngram.get_freq_value("bnc"), 3);
    assert_eq!(cand.occurs[0].sources, vec!["1:1".to_string(), "2:1".to_string()]);
    assert_eq!(cand.features.get("pmi"), Some(&crate::base::FeatValue::Real(1.5)));
    assert_eq!(cand.tpclasses.get("gold").map(String::as_str), Some("True"));
  }

  #[test]
  fn header_names_the_category() {
    assert_eq!(
      xml_header(Category::Corpus),
      "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE corpus SYSTEM \"dtd/mwetoolkit-corpus.dtd\">\n\
       <!-- MWETOOLKIT: filetype=\"XML\" -->\n<corpus >\n"
    );
  }
}
