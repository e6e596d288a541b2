//! Site-wide SEO cache and per-link scorer (§4.E). The cache is an
//! in-memory projection over the whole catalog: anchor usage, the link
//! graph, reciprocal pairs, orphans, first-link-per-target, and global plus
//! topic-restricted PageRank. It refreshes on a TTL and exposes the
//! 10-step composite score used to rank individual link proposals.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::article::{Article, AnchorType, ContentType, DismissedLink};
use crate::html;
use crate::scoring::pagerank::{self, PageRank};
use crate::text;

pub const SEO_CACHE_TTL: Duration = Duration::from_secs(15 * 60);
pub const ARTICLE_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Derived, keyed by lowercased anchor text (§3 Anchor usage entry).
#[derive(Debug, Clone)]
pub struct AnchorUsage {
    pub count: u32,
    pub target_ids: Vec<i64>,
    pub source_ids: Vec<i64>,
    pub anchor_type: AnchorType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OrphanEntry {
    pub post_id: i64,
    pub inbound_link_count: u32,
    pub critical: bool,
}

#[derive(Debug, Clone)]
pub struct FirstLink {
    pub anchor: String,
    pub source_id: i64,
    pub created_at: DateTime<Utc>,
}

/// The refreshed projection over the catalog. Built by [`SeoCache::refresh`]
/// and read by the per-link scorer.
#[derive(Debug, Clone, Default)]
pub struct SeoSnapshot {
    pub articles: HashMap<i64, Article>,
    pub link_graph: HashMap<i64, Vec<i64>>,
    pub reciprocal_pairs: HashSet<(i64, i64)>,
    pub anchor_usage: HashMap<String, AnchorUsage>,
    pub anchor_type_counts: HashMap<AnchorType, u32>,
    pub orphans: Vec<OrphanEntry>,
    /// target_id -> first link ever recorded to it, site-wide.
    pub first_links: HashMap<i64, FirstLink>,
    pub pagerank: PageRank,
    pub topic_pagerank: HashMap<String, PageRank>,
}

pub struct SeoCache {
    snapshot: RwLock<SeoSnapshot>,
    dismissed: RwLock<HashMap<i64, Vec<DismissedLink>>>,
    last_refresh: RwLock<Option<Instant>>,
}

impl Default for SeoCache {
    fn default() -> Self {
        Self {
            snapshot: RwLock::new(SeoSnapshot::default()),
            dismissed: RwLock::new(HashMap::new()),
            last_refresh: RwLock::new(None),
        }
    }
}

impl SeoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale(&self) -> bool {
        match *self.last_refresh.read().unwrap() {
            Some(instant) => instant.elapsed() >= SEO_CACHE_TTL,
            None => true,
        }
    }

    /// Rebuilds the snapshot from the full article list. Preserves
    /// dismissed-opportunity state across the refresh (§4.E).
    pub fn refresh(&self, articles: Vec<Article>) {
        let dismissed_snapshot: HashMap<i64, Vec<DismissedLink>> = articles
            .iter()
            .map(|a| (a.post_id, a.dismissed_links.clone()))
            .collect();

        let mut link_graph: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut anchor_usage: HashMap<String, AnchorUsage> = HashMap::new();
        let mut anchor_type_counts: HashMap<AnchorType, u32> = HashMap::new();
        let mut first_links: HashMap<i64, FirstLink> = HashMap::new();

        for article in &articles {
            let targets: Vec<i64> = article.outbound_links.iter().map(|l| l.target_id).collect();
            link_graph.insert(article.post_id, targets);

            for link in &article.outbound_links {
                let key = link.anchor.to_lowercase();
                let anchor_type = classify_anchor(&link.anchor, &article.title);
                let entry = anchor_usage.entry(key).or_insert_with(|| AnchorUsage {
                    count: 0,
                    target_ids: Vec::new(),
                    source_ids: Vec::new(),
                    anchor_type,
                    created_at: link.created_at,
                });
                entry.count += 1;
                entry.target_ids.push(link.target_id);
                entry.source_ids.push(article.post_id);
                if link.created_at < entry.created_at {
                    entry.created_at = link.created_at;
                }
                *anchor_type_counts.entry(anchor_type).or_insert(0) += 1;

                let candidate = FirstLink {
                    anchor: link.anchor.clone(),
                    source_id: article.post_id,
                    created_at: link.created_at,
                };
                first_links
                    .entry(link.target_id)
                    .and_modify(|existing| {
                        if candidate.created_at < existing.created_at {
                            *existing = candidate.clone();
                        }
                    })
                    .or_insert(candidate);
            }
        }

        let mut reciprocal_pairs = HashSet::new();
        for (&source, targets) in &link_graph {
            for &target in targets {
                if link_graph.get(&target).map(|back| back.contains(&source)).unwrap_or(false) {
                    let pair = if source < target { (source, target) } else { (target, source) };
                    reciprocal_pairs.insert(pair);
                }
            }
        }

        let orphans: Vec<OrphanEntry> = articles
            .iter()
            .filter(|a| a.inbound_link_count <= 2)
            .map(|a| OrphanEntry {
                post_id: a.post_id,
                inbound_link_count: a.inbound_link_count,
                critical: a.inbound_link_count == 0,
            })
            .collect();

        let nodes: Vec<i64> = articles.iter().map(|a| a.post_id).collect();
        let pillars: Vec<i64> = articles.iter().filter(|a| a.is_pillar).map(|a| a.post_id).collect();
        let global_pagerank = pagerank::compute(&nodes, &link_graph, &pillars);

        let mut clusters: HashMap<String, Vec<i64>> = HashMap::new();
        for article in &articles {
            clusters.entry(article.topic_cluster.clone()).or_default().push(article.post_id);
        }
        let topic_pagerank: HashMap<String, PageRank> = clusters
            .into_iter()
            .filter(|(_, ids)| ids.len() >= 2)
            .map(|(cluster, ids)| (cluster, pagerank::topic_pagerank(&ids, &link_graph, &pillars)))
            .collect();

        let snapshot = SeoSnapshot {
            articles: articles.into_iter().map(|a| (a.post_id, a)).collect(),
            link_graph,
            reciprocal_pairs,
            anchor_usage,
            anchor_type_counts,
            orphans,
            first_links,
            pagerank: global_pagerank,
            topic_pagerank,
        };

        *self.snapshot.write().unwrap() = snapshot;
        *self.dismissed.write().unwrap() = dismissed_snapshot;
        *self.last_refresh.write().unwrap() = Some(Instant::now());
    }

    pub fn snapshot(&self) -> SeoSnapshot {
        self.snapshot.read().unwrap().clone()
    }

    pub fn dismissed_for(&self, post_id: i64) -> Vec<DismissedLink> {
        self.dismissed.read().unwrap().get(&post_id).cloned().unwrap_or_default()
    }

    pub fn dismiss(&self, post_id: i64, target_id: i64, reason: Option<String>) {
        let mut dismissed = self.dismissed.write().unwrap();
        let entry = dismissed.entry(post_id).or_default();
        if !entry.iter().any(|d| d.target_id == target_id) {
            entry.push(DismissedLink { target_id, dismissed_at: Utc::now(), reason });
        }
    }

    pub fn restore(&self, post_id: i64, target_id: i64) {
        if let Some(entry) = self.dismissed.write().unwrap().get_mut(&post_id) {
            entry.retain(|d| d.target_id != target_id);
        }
    }

    pub fn clear_dismissed(&self, post_id: i64) {
        self.dismissed.write().unwrap().remove(&post_id);
    }

    /// Records a newly inserted link into the live snapshot without waiting
    /// for the next full refresh (§4.H step 12, incremental cache update).
    pub fn track_anchor_usage(&self, source_id: i64, target_id: i64, anchor: &str) {
        let mut snapshot = self.snapshot.write().unwrap();
        let title = snapshot.articles.get(&source_id).map(|a| a.title.clone()).unwrap_or_default();
        let anchor_type = classify_anchor(anchor, &title);
        let key = anchor.to_lowercase();
        let now = Utc::now();
        let entry = snapshot.anchor_usage.entry(key).or_insert_with(|| AnchorUsage {
            count: 0,
            target_ids: Vec::new(),
            source_ids: Vec::new(),
            anchor_type,
            created_at: now,
        });
        entry.count += 1;
        entry.target_ids.push(target_id);
        entry.source_ids.push(source_id);
        *snapshot.anchor_type_counts.entry(anchor_type).or_insert(0) += 1;

        snapshot.link_graph.entry(source_id).or_default().push(target_id);
        if snapshot
            .link_graph
            .get(&target_id)
            .map(|back| back.contains(&source_id))
            .unwrap_or(false)
        {
            let pair = if source_id < target_id { (source_id, target_id) } else { (target_id, source_id) };
            snapshot.reciprocal_pairs.insert(pair);
        }
        snapshot.first_links.entry(target_id).or_insert(FirstLink {
            anchor: anchor.to_string(),
            source_id,
            created_at: now,
        });
        if let Some(target) = snapshot.articles.get_mut(&target_id) {
            target.inbound_link_count += 1;
        }
    }
}

/// Heuristic anchor classification (§3 glossary: branded, exact_match,
/// partial_match, generic, naked_url, natural).
pub fn classify_anchor(anchor: &str, source_title: &str) -> AnchorType {
    let trimmed = anchor.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return AnchorType::NakedUrl;
    }
    let lower = trimmed.to_lowercase();
    if text::GENERIC_PHRASES.iter().any(|g| lower == *g) {
        return AnchorType::Generic;
    }
    let title_lower = source_title.to_lowercase();
    if !title_lower.is_empty() && title_lower.contains(&lower) {
        return AnchorType::ExactMatch;
    }
    let title_words: HashSet<&str> = title_lower.split_whitespace().collect();
    let anchor_words: Vec<&str> = lower.split_whitespace().collect();
    if !anchor_words.is_empty() && anchor_words.iter().any(|w| title_words.contains(w)) {
        return AnchorType::PartialMatch;
    }
    if anchor_words.len() <= 2 {
        AnchorType::Branded
    } else {
        AnchorType::Natural
    }
}

/// Full breakdown of a per-link SEO score, suitable for surfacing in API
/// responses (§4.H step 13 seoSummary, §8 S5 reciprocal-penalty scenario).
#[derive(Debug, Clone)]
pub struct SeoScoreBreakdown {
    pub allowed: bool,
    pub anchor_diversity: f64,
    pub anchor_ratio: f64,
    pub keyword_alignment: f64,
    pub link_position: f64,
    pub first_link: f64,
    pub reciprocal: ReciprocalComponent,
    pub pagerank_bonus: f64,
    pub relevance_decay: RelevanceDecayComponent,
    pub context_quality: f64,
    pub raw_total: f64,
    pub score: f64,
    pub overused_anchor: bool,
}

#[derive(Debug, Clone)]
pub struct ReciprocalComponent {
    pub score: f64,
    pub is_reciprocal: bool,
}

#[derive(Debug, Clone)]
pub struct RelevanceDecayComponent {
    pub score: f64,
    pub decay: &'static str,
}

pub struct SeoScoreInput<'a> {
    pub source: &'a Article,
    pub target: &'a Article,
    pub anchor: &'a str,
    pub anchor_offset: usize,
    pub source_plain_body: &'a str,
    pub source_html_body: &'a str,
}

/// The 10-step composite SEO score (§4.E). Returns a breakdown with the
/// final score normalized from the raw -15..180 range to 0-100; when the
/// hard gate fails (source is a page) `allowed` is false and `score` is 0.
pub fn score_link(cache: &SeoCache, input: &SeoScoreInput) -> SeoScoreBreakdown {
    if input.source.content_type == ContentType::Page {
        return SeoScoreBreakdown {
            allowed: false,
            anchor_diversity: 0.0,
            anchor_ratio: 0.0,
            keyword_alignment: 0.0,
            link_position: 0.0,
            first_link: 0.0,
            reciprocal: ReciprocalComponent { score: 0.0, is_reciprocal: false },
            pagerank_bonus: 0.0,
            relevance_decay: RelevanceDecayComponent { score: 0.0, decay: "n/a" },
            context_quality: 0.0,
            raw_total: -999.0,
            score: 0.0,
            overused_anchor: false,
        };
    }

    let snapshot = cache.snapshot();
    let key = input.anchor.to_lowercase();

    let usage_count = snapshot.anchor_usage.get(&key).map(|u| u.count).unwrap_or(0);
    let overused_anchor = usage_count > 10;
    let anchor_diversity = anchor_diversity_score(usage_count);

    let anchor_ratio = anchor_ratio_score(&snapshot, input.anchor, &input.source.title);

    let keyword_alignment = keyword_alignment_score(input.anchor, input.target);

    let semantic_tag = html::enclosing_semantic_tag(input.source_html_body, input.anchor_offset, 200);
    let percentile = html::percentile_of(input.anchor_offset, input.source_plain_body);
    let link_position = link_position_score(semantic_tag.as_deref(), percentile);

    let already_linked = snapshot
        .link_graph
        .get(&input.source.post_id)
        .map(|targets| targets.contains(&input.target.post_id))
        .unwrap_or(false);
    let first_link = first_link_score(&snapshot, input.target.post_id, input.anchor, already_linked);

    let target_links_back = snapshot
        .link_graph
        .get(&input.target.post_id)
        .map(|targets| targets.contains(&input.source.post_id))
        .unwrap_or(false);
    let pair = if input.source.post_id < input.target.post_id {
        (input.source.post_id, input.target.post_id)
    } else {
        (input.target.post_id, input.source.post_id)
    };
    let in_reciprocal_set = snapshot.reciprocal_pairs.contains(&pair);
    let reciprocal = reciprocal_score(target_links_back, in_reciprocal_set);

    let pagerank_bonus = pagerank_bonus_score(&snapshot, input.source, input.target);

    let relevance_decay = relevance_decay_score(input.target.updated_at);

    let context_quality = context_quality_score(input.source_plain_body, input.anchor_offset, input.anchor);

    let raw_total = anchor_diversity
        + anchor_ratio
        + keyword_alignment
        + link_position
        + first_link
        + reciprocal.score
        + pagerank_bonus
        + relevance_decay.score
        + context_quality;

    let score = normalize_score(raw_total);

    SeoScoreBreakdown {
        allowed: true,
        anchor_diversity,
        anchor_ratio,
        keyword_alignment,
        link_position,
        first_link,
        reciprocal,
        pagerank_bonus,
        relevance_decay,
        context_quality,
        raw_total,
        score,
        overused_anchor,
    }
}

/// 0-30, stepped down as an anchor is reused more across the site.
fn anchor_diversity_score(usage_count: u32) -> f64 {
    match usage_count {
        0 => 30.0,
        1 => 28.0,
        2 => 25.0,
        3..=5 => 20.0,
        6..=10 => 10.0,
        _ => 0.0,
    }
}

/// 0-20, penalizing anchor categories that are already over-represented
/// site-wide (e.g. too many naked-url or generic anchors).
fn anchor_ratio_score(snapshot: &SeoSnapshot, anchor: &str, source_title: &str) -> f64 {
    let anchor_type = classify_anchor(anchor, source_title);
    let total: u32 = snapshot.anchor_type_counts.values().sum();
    if total == 0 {
        return 20.0;
    }
    let type_count = snapshot.anchor_type_counts.get(&anchor_type).copied().unwrap_or(0);
    let ratio = type_count as f64 / total as f64;
    if ratio < 0.2 {
        20.0
    } else if ratio < 0.4 {
        14.0
    } else if ratio < 0.6 {
        8.0
    } else {
        2.0
    }
}

/// 0-25: how well the anchor text aligns with the target's keywords, with
/// stem-folding (0.8 weight) and synonym expansion.
fn keyword_alignment_score(anchor: &str, target: &Article) -> f64 {
    let anchor_lower = anchor.to_lowercase();
    let anchor_words: HashSet<String> = text::tokenize(&anchor_lower).into_iter().collect();
    if anchor_words.is_empty() || target.semantic_keywords.is_empty() {
        return 0.0;
    }

    let mut best = 0.0_f64;
    for keyword in &target.semantic_keywords {
        let keyword_lower = keyword.to_lowercase();
        if anchor_lower == keyword_lower || anchor_lower.contains(&keyword_lower) {
            best = best.max(1.0);
            continue;
        }
        if text::is_synonym(&anchor_lower, &keyword_lower) {
            best = best.max(0.9);
            continue;
        }
        let keyword_words: Vec<String> = text::tokenize(&keyword_lower);
        let stem_match = keyword_words
            .iter()
            .any(|kw| anchor_words.iter().any(|aw| text::same_stem(aw, kw)));
        if stem_match {
            best = best.max(0.8);
        }
    }
    best * 25.0
}

/// 0-25 with semantic-tag overrides taking priority over the percentile
/// bucket derived from content position. Non-semantic placements top out
/// at 20 (an h1-h6 anchor still scores highest at 25).
fn link_position_score(semantic_tag: Option<&str>, percentile: f64) -> f64 {
    match semantic_tag {
        Some(tag) if tag.starts_with('h') => 25.0,
        Some("li") => 22.0,
        Some("blockquote") => 20.0,
        _ => {
            if percentile <= 5.0 {
                20.0
            } else if percentile <= 10.0 {
                19.0
            } else if percentile <= 20.0 {
                17.0
            } else if percentile <= 35.0 {
                15.0
            } else if percentile <= 50.0 {
                13.0
            } else if percentile <= 65.0 {
                11.0
            } else if percentile <= 85.0 {
                9.0
            } else {
                7.0
            }
        }
    }
}

/// 0-15: rewards being the first link site-wide to a target, and partially
/// rewards matching the existing first-link anchor when one already exists.
fn first_link_score(snapshot: &SeoSnapshot, target_id: i64, anchor: &str, already_linked: bool) -> f64 {
    if already_linked {
        return 0.0;
    }
    match snapshot.first_links.get(&target_id) {
        None => 15.0,
        Some(existing) if existing.anchor.eq_ignore_ascii_case(anchor) => 12.0,
        Some(_) => 8.0,
    }
}

/// -15..0: penalizes links that would create or reinforce a reciprocal pair.
fn reciprocal_score(target_links_back: bool, in_reciprocal_set: bool) -> ReciprocalComponent {
    if target_links_back {
        ReciprocalComponent { score: -15.0, is_reciprocal: true }
    } else if in_reciprocal_set {
        ReciprocalComponent { score: -10.0, is_reciprocal: true }
    } else {
        ReciprocalComponent { score: 0.0, is_reciprocal: false }
    }
}

/// 0-25: rewards links from high-authority sources to lower-authority
/// targets (spreading link equity), plus a topic-PageRank bonus.
fn pagerank_bonus_score(snapshot: &SeoSnapshot, source: &Article, target: &Article) -> f64 {
    let source_pr = snapshot.pagerank.get(source.post_id);
    let target_pr = snapshot.pagerank.get(target.post_id);

    let base = if source_pr > 60.0 && target_pr < 40.0 {
        20.0
    } else if source_pr > 40.0 && target_pr < 60.0 {
        15.0
    } else if target_pr > 60.0 {
        10.0
    } else {
        5.0
    };

    let topic_bonus = snapshot
        .topic_pagerank
        .get(&target.topic_cluster)
        .map(|pr| {
            if pr.get(source.post_id) > 60.0 && pr.get(target.post_id) < 40.0 {
                5.0
            } else {
                0.0
            }
        })
        .unwrap_or(0.0);

    base + topic_bonus
}

/// 0-15, bucketed by days since the target was last updated.
fn relevance_decay_score(updated_at: DateTime<Utc>) -> RelevanceDecayComponent {
    let days = (Utc::now() - updated_at).num_days();
    if days <= 30 {
        RelevanceDecayComponent { score: 15.0, decay: "fresh" }
    } else if days <= 90 {
        RelevanceDecayComponent { score: 12.0, decay: "recent" }
    } else if days <= 180 {
        RelevanceDecayComponent { score: 10.0, decay: "aging" }
    } else if days <= 365 {
        RelevanceDecayComponent { score: 7.0, decay: "old" }
    } else {
        RelevanceDecayComponent { score: 5.0, decay: "stale" }
    }
}

/// 0-25: inspects roughly 100 characters on either side of the anchor
/// occurrence for topical density (non-stopword ratio) as a crude proxy for
/// surrounding context quality.
fn context_quality_score(plain_body: &str, offset: usize, anchor: &str) -> f64 {
    let start = offset.saturating_sub(100);
    let end = (offset + anchor.len() + 100).min(plain_body.len());
    let Some(window) = plain_body.get(start..end) else { return 10.0 };
    let words = text::tokenize(window);
    if words.is_empty() {
        return 10.0;
    }
    let content_words = words.iter().filter(|w| w.len() > 2 && !text::STOPWORDS.contains(&w.as_str())).count();
    let ratio = content_words as f64 / words.len() as f64;
    (ratio * 25.0).min(25.0)
}

/// Normalizes the raw -15..180 total to a 0-100 scale.
fn normalize_score(raw_total: f64) -> f64 {
    let clamped = raw_total.clamp(-15.0, 180.0);
    ((clamped + 15.0) / 195.0 * 100.0).clamp(0.0, 100.0)
}
