// SPDX-FileCopyrightText: 2026 Scriven contributors
// SPDX-License-Identifier: MIT

use crate::model::{Node, NodeId, NodeKind};

const EXCERPT_MAX_CHARS: usize = 120;

/// Minimum `rapidfuzz` ratio (0..=100) a non-substring candidate must reach.
const FUZZY_CUTOFF: f64 = 55.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TextMatch {
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub excerpt: String,
    pub score: i64,
}

/// Ranks value-carrying nodes against `query`.
///
/// Exact substring hits always outrank fuzzy ones; among fuzzy hits the
/// `rapidfuzz` ratio decides. Ties keep pre-order, so results are
/// deterministic for a given tree. Nodes without an id (unassigned trees)
/// are skipped.
pub fn search_by_text(root: &Node, query: &str, limit: usize) -> Vec<TextMatch> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(i64, usize, TextMatch)> = Vec::new();

    fn walk<'a>(node: &'a Node, out: &mut Vec<(&'a Node, usize)>, counter: &mut usize) {
        let order = *counter;
        *counter = counter.saturating_add(1);
        if node.value().is_some() && node.id().is_some() {
            out.push((node, order));
        }
        for child in node.children().into_iter().flatten() {
            walk(child, out, counter);
        }
    }

    let mut candidates = Vec::new();
    let mut counter = 0usize;
    walk(root, &mut candidates, &mut counter);

    for (node, order) in candidates {
        let (value, node_id) = match (node.value(), node.id()) {
            (Some(value), Some(node_id)) => (value, node_id),
            _ => continue,
        };
        let haystack = value.to_lowercase();

        let score = if haystack.contains(&needle) {
            let first = haystack.find(&needle).unwrap_or(0);
            let mut score = 200_000i64.saturating_sub((first as i64) * 100);
            score -= haystack.chars().count() as i64;
            if haystack == needle {
                score += 50_000;
            }
            score
        } else {
            let ratio = rapidfuzz::fuzz::ratio(needle.chars(), haystack.chars());
            if ratio < FUZZY_CUTOFF {
                continue;
            }
            (ratio * 1000.0).round() as i64
        };

        scored.push((
            score,
            order,
            TextMatch {
                node_id: node_id.clone(),
                kind: node.kind().clone(),
                excerpt: excerpt(value),
                score,
            },
        ));
    }

    scored.sort_by(|(score_a, order_a, _), (score_b, order_b, _)| {
        score_b.cmp(score_a).then_with(|| order_a.cmp(order_b))
    });

    scored
        .into_iter()
        .take(limit)
        .map(|(_, _, text_match)| text_match)
        .collect()
}

fn excerpt(value: &str) -> String {
    if value.chars().count() <= EXCERPT_MAX_CHARS {
        return value.to_owned();
    }
    let mut out: String = value.chars().take(EXCERPT_MAX_CHARS).collect();
    out.push('\u{2026}');
    out
}
