//! HTML output of an annotated corpus, for in-browser visualization
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use super::common::{Directive, PrinterCore};
use super::handler::InputHandler;
use super::{Category, FiletypeInfo, ParseInfo};
use crate::base::{escape_text, Meta, Sentence, Word, WordAttr};
use crate::error::Result;
use crate::util::deterministic_mode;

/// Written instead of the timestamp in deterministic mode
pub const DETERMINISTIC_TIMESTAMP: &str = "[MWETOOLKIT_DETERMINISTIC_MODE]";

/// HTML description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "HTML",
  description: "Pretty HTML for in-browser visualization",
  comment_prefix: "#",
  escape_pairs: &[],
  checker: check,
  parser: None,
  printer: Some(new_printer),
  input_categories: &[],
  output_categories: &[Category::Corpus],
};

const STYLE: &str = "    <style>
    h1{margin:0}
    p.notice{font-family:Arial;font-size:10pt;margin:0}
    hr{margin:10px 0}
    p.sent{margin:2px 100px 2px 0;line-height:145%;padding:4px 2px}
    p.sent:hover{background-color:#FFC}
    p.sent span.sid{border:1px solid #000;border-radius:2px;padding:1px 5px}
    p.sent:hover span.sid{background:#F22;color:#FFF}
    p.sent:hover a.word{border-color:#03A}
    span.mwepart a.word{border:2px solid #000}
    span.mwe1 a.word{background-color:#F66}
    span.mwe2 a.word{background-color:#9C0}
    span.mwe3 a.word{background-color:#69F}
    span.mwe4 a.word{background-color:#F90}
    a.word{position:relative;border:1px solid #CCF;border-radius:2px;padding:1px 2px;margin:auto 0;font-family:Verdana sans-serif;text-decoration:none;color:#000}
    a.word:hover{background-color:#03A;border-color:#000;color:#FFF}
    a.word span.surface{font-weight:700}
    a.word span.wid{font-size:70%;position:relative;top:.3em;font-style:italic;padding-left:3px}
    a.word span.lps{color:#000;padding:2px 5px;top:1em;z-index:1;height:auto;opacity:0;position:absolute;visibility:hidden;background-color:#AAA;border:1px solid #000;border-radius:2px;box-shadow:#000 2px 2px 6px}
    a.word:hover span.lps{opacity:.95;visibility:visible}
    a.word span.lps span.lemma{font-style:italic;display:block}
    a.word span.lps span.pos{font-weight:700;display:block}
    a.word span.lps span.syn{font-weight:400;display:block;font-family:Arial}
    </style>
";

fn check(_header: &[u8], strict: bool) -> bool { !strict }

fn new_printer(category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  Ok(Box::new(HtmlPrinter {
    core: PrinterCore::new(&INFO, category, output)?,
  }))
}

fn timestamp() -> String {
  if deterministic_mode() {
    DETERMINISTIC_TIMESTAMP.to_string()
  } else {
    time::strftime("%Y-%m-%d %H:%M:%S", &time::now()).unwrap_or_default()
  }
}

/// Page header, from `<!DOCTYPE` down to the horizontal rule
pub fn page_header(filename: &str) -> String {
  let basename = Path::new(filename)
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| filename.to_string());
  let basename = escape_text(&basename);
  let mut header = String::from(
    "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\"\n\
     \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\">\n<html>\n<head>\n    \
     <meta http-equiv=\"Content-Type\" content=\"text/html; charset=utf-8\"/>\n",
  );
  header.push_str(&format!("    <title>MWETOOLKIT annotated corpus: {}</title>\n", basename));
  header.push_str(STYLE);
  header.push_str("</head>\n<body>\n");
  header.push_str(&format!("<h1>Corpus: {}</h1>\n", basename));
  header.push_str(
    "<p class=\"notice\">Generated automatically by the \
     <a href=\"http://mwetoolkit.sf.net/\" target=\"_blank\">mwetoolkit</a> </p>\n",
  );
  header.push_str(&format!("<p class=\"notice\"> Timestamp: {}</p>\n", timestamp()));
  header.push_str(&format!("<p class=\"notice\">Source: <tt>{}</tt></p>\n<hr/>", basename));
  header
}

/// A word as a link whose tooltip shows lemma, POS and syntax
pub fn word_to_html(word: &Word, wid: usize) -> String {
  let span = |attr: WordAttr| {
    format!(
      "<span class=\"{}\">{}</span>",
      attr.name(),
      escape_text(word.get(attr).unwrap_or(""))
    )
  };
  format!(
    "<a href=\"#\" class=\"word\">{}<span class=\"wid\">{}</span><span class=\"lps\">{}{}{}</span></a>",
    span(WordAttr::Surface),
    wid,
    span(WordAttr::Lemma),
    span(WordAttr::Pos),
    span(WordAttr::Syn)
  )
}

/// The sentence as a paragraph; MWE parts are wrapped in spans numbered `mwe1`, `mwe2`...
pub fn sentence_to_html(sentence: &Sentence) -> String {
  let mut classes: HashMap<u64, String> = HashMap::new();
  for (i, mweo) in sentence.mweoccurs.iter().enumerate() {
    classes.insert(mweo.candidate.id_number, format!("mwe{}", i + 1));
  }
  let tokens: Vec<String> = sentence
    .words
    .iter()
    .zip(sentence.mwe_ids_per_word())
    .enumerate()
    .map(|(i, (word, ids))| {
      let html = word_to_html(word, i + 1);
      if ids.is_empty() {
        html
      } else {
        let names: Vec<&str> = ids.iter().filter_map(|id| classes.get(id)).map(String::as_str).collect();
        format!("<span class=\"mwepart {}\">{}</span>", names.join(" "), html)
      }
    })
    .collect();
  format!(
    "<p class=\"sent\">\n<span class=\"sid\">{}</span>\n{}</p>",
    sentence.id_number,
    tokens.join("\n")
  )
}

struct HtmlPrinter {
  core: PrinterCore,
}

impl InputHandler for HtmlPrinter {
  fn before_file(&mut self, info: &ParseInfo) -> Result<()> {
    let header = page_header(&info.filename);
    self.core.add_string(&header)?;
    if let Some(directive) = self.core.take_directive() {
      self.handle_comment(&directive.to_string(), info)?;
    }
    Ok(())
  }

  fn after_file(&mut self, _info: &ParseInfo) -> Result<()> {
    self.core.add_string("</body>\n</html>")?;
    self.core.flush()
  }

  fn handle_comment(&mut self, comment: &str, _info: &ParseInfo) -> Result<()> {
    let text = format!("<!-- {} -->\n", comment);
    self.core.add_string(&text)
  }

  fn handle_directive(&mut self, directive: &Directive, info: &ParseInfo) -> Result<()> {
    if directive.key == "filetype" {
      return Ok(());
    }
    self.handle_comment(&directive.to_string(), info)
  }

  fn handle_meta(&mut self, _meta: Meta, _info: &ParseInfo) -> Result<()> { Ok(()) }

  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    let html = sentence_to_html(&sentence) + "\n";
    self.core.add_string(&html)
  }

  fn flush(&mut self) -> Result<()> { self.core.flush() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mwe_parts_get_numbered_spans() {
    let mut sentence = Sentence::new(
      7,
      vec![
        Word::from_attrs(Some("kick"), Some("kick"), Some("V"), None),
        Word::from_attrs(Some("it"), None, None, None),
      ],
    );
    sentence.annotate_span(42, vec![0, 1]).unwrap();
    let html = sentence_to_html(&sentence);
    assert!(html.starts_with("<p class=\"sent\">\n<span class=\"sid\">7</span>\n"));
    assert!(html.contains("<span class=\"mwepart mwe1\"><a href=\"#\" class=\"word\"><span class=\"surface\">kick</span><span class=\"wid\">1</span>"));
    assert!(html.ends_with("</a></span></p>"));
  }

  #[test]
  fn header_names_the_source() {
    let header = page_header("/data/corpus.xml");
    assert!(header.contains("<title>MWETOOLKIT annotated corpus: corpus.xml</title>"));
    assert!(header.contains("line-height:145%;"));
    assert!(header.ends_with("<hr/>"));
  }
}
