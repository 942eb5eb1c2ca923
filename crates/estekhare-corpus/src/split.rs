//! Section splitting: groups the flat line sequence into per-record runs.

use crate::parse::PAGE_MARKER;

/// Split `lines` into sections, one per page marker.
///
/// A section starts at every line beginning with [`PAGE_MARKER`] and runs up
/// to, but not including, the next marker. Lines before the first marker
/// belong to no section and are dropped; input without any marker yields no
/// sections.
pub fn split_sections<S: AsRef<str>>(lines: &[S]) -> Vec<&[S]> {
  let starts: Vec<usize> = lines
    .iter()
    .enumerate()
    .filter(|(_, l)| l.as_ref().starts_with(PAGE_MARKER))
    .map(|(i, _)| i)
    .collect();

  starts
    .iter()
    .enumerate()
    .map(|(n, &start)| {
      let end = starts.get(n + 1).copied().unwrap_or(lines.len());
      &lines[start..end]
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn no_markers_no_sections() {
    let lines = ["نام سوره: بقره", "some wrapped text", "نتیجه استخاره شما: خوب"];
    assert!(split_sections(&lines).is_empty());
    assert!(split_sections::<&str>(&[]).is_empty());
  }

  #[test]
  fn preamble_is_dropped() {
    let lines = ["title", "intro", "شماره صفحه: 1", "a", "شماره صفحه: 2"];
    let sections = split_sections(&lines);
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0], ["شماره صفحه: 1", "a"]);
    assert_eq!(sections[1], ["شماره صفحه: 2"]);
  }

  #[test]
  fn concatenation_reconstructs_input_from_first_marker() {
    let lines = [
      "preamble",
      "شماره صفحه: 3",
      "نام سوره: X",
      "متن آیه: one",
      "two",
      "شماره صفحه: 4",
      "ترجمه (فولادوند): t",
      "شماره صفحه: 5",
    ];
    let sections = split_sections(&lines);
    assert_eq!(sections.len(), 3);

    let joined: Vec<&str> = sections.iter().flat_map(|s| s.iter().copied()).collect();
    assert_eq!(joined, &lines[1..]);
    assert!(sections.iter().all(|s| s[0].starts_with(PAGE_MARKER)));
  }

  #[test]
  fn marker_must_be_a_prefix() {
    let lines = ["see شماره صفحه: 9", "شماره صفحه: 10", "x شماره صفحه: 11"];
    let sections = split_sections(&lines);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].len(), 2);
  }
}
