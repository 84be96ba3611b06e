//! ターミナル向けMarkdown整形
//!
//! レポート解説文（LLM生成のMarkdown）を端末で読める形にする。
//! 対応: 見出し、箇条書き、番号付きリスト、強調記号の除去、水平線、GFM表。

use regex::Regex;

const RULE_WIDTH: usize = 48;

/// Markdownテキストを端末表示用のプレーンテキストに変換
pub fn render_markdown(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut table: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('|') {
            table.push(trimmed);
            continue;
        }
        if !table.is_empty() {
            out.extend(render_table(&table));
            table.clear();
        }

        if trimmed.is_empty() {
            // 連続する空行は1行にまとめる
            if out.last().is_some_and(|l| !l.is_empty()) {
                out.push(String::new());
            }
            continue;
        }

        if is_rule(trimmed) {
            out.push("─".repeat(RULE_WIDTH));
            continue;
        }

        if let Some((level, heading)) = parse_heading(trimmed) {
            let heading = strip_inline(heading);
            let underline = if level <= 1 { '═' } else { '─' };
            let width = heading.chars().count();
            out.push(heading);
            out.push(underline.to_string().repeat(width));
            continue;
        }

        let indent = line.len() - line.trim_start().len();
        let pad = " ".repeat(indent.min(8));
        if let Some(item) = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
            .or_else(|| trimmed.strip_prefix("+ "))
        {
            out.push(format!("{}  • {}", pad, strip_inline(item)));
            continue;
        }

        out.push(format!("{}{}", pad, strip_inline(trimmed)));
    }

    if !table.is_empty() {
        out.extend(render_table(&table));
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }

    out.join("\n")
}

fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    line[level..].strip_prefix(' ').map(|rest| (level, rest.trim()))
}

fn is_rule(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && (compact.chars().all(|c| c == '-')
            || compact.chars().all(|c| c == '*')
            || compact.chars().all(|c| c == '_'))
}

/// `**強調**` `*斜体*` `` `code` `` `[text](url)` の記号を除去
fn strip_inline(text: &str) -> String {
    lazy_static::lazy_static! {
        static ref LINK_RE: Regex = Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap();
        static ref STRONG_RE: Regex = Regex::new(r"(\*\*|__)(.+?)(\*\*|__)").unwrap();
        static ref EM_RE: Regex = Regex::new(r"\*([^*\s][^*]*)\*").unwrap();
        static ref CODE_RE: Regex = Regex::new(r"`([^`]+)`").unwrap();
    }

    let text = LINK_RE.replace_all(text, "$1 ($2)");
    let text = STRONG_RE.replace_all(&text, "$2");
    let text = EM_RE.replace_all(&text, "$1");
    CODE_RE.replace_all(&text, "$1").into_owned()
}

fn split_row(row: &str) -> Vec<String> {
    let inner = row.strip_prefix('|').unwrap_or(row);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| strip_inline(c.trim())).collect()
}

fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|c| {
            let c = c.trim_matches(':');
            !c.is_empty() && c.chars().all(|ch| ch == '-')
        })
}

/// GFM表を列幅を揃えて描画。区切り行はヘッダー下の罫線に置き換える
fn render_table(rows: &[&str]) -> Vec<String> {
    let parsed: Vec<Vec<String>> = rows.iter().map(|r| split_row(r)).collect();
    let has_header = parsed.get(1).is_some_and(|r| is_separator_row(r));
    let body: Vec<&Vec<String>> = parsed.iter().filter(|r| !is_separator_row(r)).collect();

    let columns = body.iter().map(|r| r.len()).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in &body {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |row: &Vec<String>| {
        let cells: Vec<String> = (0..columns)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let pad = widths[i] - cell.chars().count();
                format!("{}{}", cell, " ".repeat(pad))
            })
            .collect();
        format!("  {}", cells.join(" │ ")).trim_end().to_string()
    };

    let mut lines = Vec::with_capacity(body.len() + 1);
    for (idx, row) in body.iter().enumerate() {
        lines.push(format_row(row));
        if idx == 0 && has_header {
            let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            lines.push(format!("  {}", rule.join("─┼─")));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_is_underlined() {
        let out = render_markdown("# Report Overview\nAll good.");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Report Overview");
        assert_eq!(lines[1], "═".repeat("Report Overview".len()));
        assert_eq!(lines[2], "All good.");
    }

    #[test]
    fn test_emphasis_and_code_are_stripped() {
        let out = render_markdown("Your **hemoglobin** is *normal* (`13.5`).");
        assert_eq!(out, "Your hemoglobin is normal (13.5).");
    }

    #[test]
    fn test_bullets() {
        let out = render_markdown("- Drink water\n* Sleep well");
        assert_eq!(out, "  • Drink water\n  • Sleep well");
    }

    #[test]
    fn test_table_is_aligned_and_separator_replaced() {
        let text = "| Parameter | Value |\n|---|---|\n| Hb | 13.5 g/dL |\n| WBC | 7200 |";
        let out = render_markdown(text);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "  Parameter │ Value");
        assert_eq!(lines[1], "  ──────────┼──────────");
        assert_eq!(lines[2], "  Hb        │ 13.5 g/dL");
        assert_eq!(lines[3], "  WBC       │ 7200");
    }

    #[test]
    fn test_blank_lines_collapse() {
        let out = render_markdown("a\n\n\n\nb\n\n");
        assert_eq!(out, "a\n\nb");
    }

    #[test]
    fn test_horizontal_rule() {
        let out = render_markdown("above\n---\nbelow");
        assert!(out.contains(&"─".repeat(RULE_WIDTH)));
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(render_markdown("Hello there."), "Hello there.");
    }
}
