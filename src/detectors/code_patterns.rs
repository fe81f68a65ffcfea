//! Code-pattern analyzer
//!
//! Diffs that parse cleanly as Python are scored on their syntax tree
//! (docstring density, variable-name entropy, block size). Everything else
//! falls back to raw text heuristics that catch common assistant scaffolding.

use crate::models::{reasons, DetectorResult};
use rustc_hash::FxHashSet;
use tree_sitter::{Node, Parser, Tree};

/// Parse `source` as Python. `None` if it does not parse cleanly.
fn parse_python(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .ok()?;
    let tree = parser.parse(source, None)?;
    if tree.root_node().has_error() {
        return None;
    }
    Some(tree)
}

/// Score a diff for structural code patterns.
pub fn analyze(diff: &str) -> DetectorResult {
    if diff.trim().is_empty() {
        return DetectorResult::no_signal(reasons::NO_CODE);
    }

    // Blank lines count toward the size of the block.
    let total_lines = diff.split('\n').count();
    match parse_python(diff) {
        Some(tree) => analyze_tree(&tree.root_node(), diff.as_bytes(), total_lines),
        None => analyze_raw(diff, total_lines),
    }
}

#[derive(Default)]
struct TreeStats<'a> {
    docstrings: usize,
    assigned: FxHashSet<&'a str>,
}

fn analyze_tree(root: &Node, source: &[u8], total_lines: usize) -> DetectorResult {
    let mut stats = TreeStats::default();
    if has_docstring(root) {
        stats.docstrings += 1;
    }
    walk(root, source, &mut stats);

    let mut score = 0.0;
    let mut found = Vec::new();

    if total_lines > 15 && stats.docstrings > 0 {
        score += 0.4;
        found.push(format!(
            "High structural docstring density ({} docstrings / {} LOC)",
            stats.docstrings, total_lines
        ));
    }

    let unique = stats.assigned.len();
    if total_lines > 20 && (unique as f64) < total_lines as f64 / 5.0 {
        score += 0.3;
        found.push(format!(
            "Low AST lexical entropy (repetitive variable space: {unique} unique vars)"
        ));
    }

    if total_lines > 50 {
        score += 0.2;
        found.push("Large structural block addition".to_string());
    }

    DetectorResult::from_reasons(f64::min(score, 1.0), found, reasons::ORGANIC_AST)
}

fn walk<'a>(node: &Node, source: &'a [u8], stats: &mut TreeStats<'a>) {
    match node.kind() {
        "function_definition" | "class_definition" => {
            if node
                .child_by_field_name("body")
                .is_some_and(|body| has_docstring(&body))
            {
                stats.docstrings += 1;
            }
        }
        "assignment" | "augmented_assignment" | "for_statement" | "for_in_clause" => {
            if let Some(target) = node.child_by_field_name("left") {
                collect_targets(&target, source, &mut stats.assigned);
            }
        }
        "named_expression" => {
            if let Some(target) = node.child_by_field_name("name") {
                collect_targets(&target, source, &mut stats.assigned);
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(&child, source, stats);
    }
}

/// Plain names bound by an assignment target. Attribute and subscript
/// targets bind nothing new.
fn collect_targets<'a>(target: &Node, source: &'a [u8], names: &mut FxHashSet<&'a str>) {
    match target.kind() {
        "identifier" => {
            if let Ok(name) = target.utf8_text(source) {
                names.insert(name);
            }
        }
        "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern"
        | "tuple" | "list" | "parenthesized_expression" => {
            let mut cursor = target.walk();
            for child in target.named_children(&mut cursor) {
                collect_targets(&child, source, names);
            }
        }
        _ => {}
    }
}

/// First statement of a module or block is a bare string literal.
fn has_docstring(body: &Node) -> bool {
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment");
    first.is_some_and(|stmt| {
        stmt.kind() == "expression_statement"
            && stmt
                .named_child(0)
                .is_some_and(|expr| expr.kind() == "string")
    })
}

fn analyze_raw(diff: &str, total_lines: usize) -> DetectorResult {
    let mut score = 0.0;
    let mut found = Vec::new();

    let comment_lines = diff
        .split('\n')
        .map(str::trim)
        .filter(|l| l.starts_with('#') || l.starts_with("//"))
        .count();

    if total_lines > 40 {
        score += 0.4;
        found.push("Large raw code block addition".to_string());
    }
    if total_lines > 10 && comment_lines as f64 / total_lines as f64 > 0.15 {
        score += 0.5;
        found.push("Unusually high raw comment density".to_string());
    }
    if diff.contains("console.log") && !diff.contains("TODO") && total_lines > 5 {
        score += 0.2;
        found.push("Debug logging left in without a TODO".to_string());
    }
    if diff.contains("useState") && diff.contains("useEffect") {
        score += 0.3;
        found.push("Generic React component scaffolding detected".to_string());
    }

    DetectorResult::from_reasons(f64::min(score, 1.0), found, reasons::ORGANIC_RAW)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_with_docstring() -> String {
        [
            "def compute_totals(orders):",
            "    \"\"\"Compute order totals.\"\"\"",
            "    subtotal = 0",
            "    tax = 0",
            "    shipping = 0",
            "    discount = 0",
            "    for order in orders:",
            "        subtotal += order.amount",
            "        tax += order.tax",
            "        shipping += order.shipping",
            "        discount += order.discount",
            "    total = subtotal + tax + shipping - discount",
            "    average = total / len(orders)",
            "    maximum = max(o.amount for o in orders)",
            "    minimum = min(o.amount for o in orders)",
            "    count = len(orders)",
            "    ratio = maximum / minimum",
            "    return total, average, count, ratio",
        ]
        .join("\n")
    }

    #[test]
    fn test_empty_diff() {
        let r = analyze("  \n ");
        assert_eq!(r.score, 0.0);
        assert_eq!(r.reason, reasons::NO_CODE);
    }

    #[test]
    fn test_small_python_is_organic() {
        let r = analyze("x = 1\ny = 2");
        assert_eq!(r.score, 0.0);
        assert_eq!(r.reason, reasons::ORGANIC_AST);
    }

    #[test]
    fn test_docstring_flagged() {
        let r = analyze(&python_with_docstring());
        assert!((r.score - 0.4).abs() < 1e-9, "{r:?}");
        assert!(r.reason.contains("1 docstrings / 18 LOC"));
    }

    #[test]
    fn test_repetitive_variables() {
        let diff = vec!["total = total + 1"; 25].join("\n");
        let r = analyze(&diff);
        assert!((r.score - 0.3).abs() < 1e-9, "{r:?}");
        assert!(r.reason.contains("1 unique vars"));
    }

    #[test]
    fn test_large_block() {
        let diff = vec!["value = compute(value)"; 60].join("\n");
        let r = analyze(&diff);
        assert!((r.score - 0.5).abs() < 1e-9, "{r:?}");
        assert!(r.reason.contains("Large structural block addition"));
    }

    #[test]
    fn test_tuple_targets_are_collected() {
        let tree = parse_python("a, (b, c) = f()\nfor i, j in pairs:\n    pass").unwrap();
        let mut stats = TreeStats::default();
        walk(&tree.root_node(), b"a, (b, c) = f()\nfor i, j in pairs:\n    pass", &mut stats);
        let mut names: Vec<_> = stats.assigned.into_iter().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b", "c", "i", "j"]);
    }

    #[test]
    fn test_react_scaffolding_raw() {
        let diff = [
            "function Counter() {",
            "  const [count, setCount] = useState(0);",
            "  useEffect(() => {",
            "    document.title = `${count}`;",
            "  }, [count]);",
            "  return <button onClick={() => setCount(count + 1)}>{count}</button>;",
            "}",
        ]
        .join("\n");
        let r = analyze(&diff);
        assert!((r.score - 0.3).abs() < 1e-9, "{r:?}");
        assert!(r.reason.contains("React"));
    }

    #[test]
    fn test_raw_comment_density() {
        let mut lines = vec!["let total = items.iter().sum::<u32>();"; 9];
        lines.extend(["// sum the items", "// then log", "// and return"]);
        let r = analyze(&lines.join("\n"));
        assert!((r.score - 0.5).abs() < 1e-9, "{r:?}");
    }

    #[test]
    fn test_console_log_without_todo() {
        let diff = "function a() {\n  console.log(1);\n  return 1;\n}\nfunction b() {\n  return 2;\n}";
        assert!((analyze(diff).score - 0.2).abs() < 1e-9);
        let with_todo = format!("{diff}\n// TODO remove");
        assert!(!analyze(&with_todo).reason.contains("Debug logging"));
    }

    #[test]
    fn test_organic_raw() {
        let r = analyze("fn main() {\n    run();\n}");
        assert_eq!(r.score, 0.0);
        assert_eq!(r.reason, reasons::ORGANIC_RAW);
    }
}
