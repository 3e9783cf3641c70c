//! Counter and histogram accumulation with text exposition rendering.
//!
//! Samples live in a [`MetricsStore`] as independent key-value fragments:
//!
//! ```text
//! metrics:names                          set of "cnt:{name}" / "hist:{name}"
//! metrics:cnt:{name}:{lk}                counter value
//! metrics:idx:cnt:{name}                 set of label keys
//! metrics:hist:{name}:{le}:{lk}          cumulative bucket count ("Inf" for +Inf)
//! metrics:hist:sum:{name}:{lk}           sum of observations
//! metrics:hist:count:{name}:{lk}         number of observations
//! metrics:idx:hist:{name}                set of label keys
//! metrics:hist:buckets:{name}            set of bucket bounds
//! ```
//!
//! `lk` is the base64url (unpadded) JSON encoding of the label set with keys
//! sorted, so equal label sets always share one key.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::infrastructure::metrics::{MetricsResult, MetricsStore};

/// Default histogram bounds, in seconds.
pub const DEFAULT_BUCKETS: [f64; 10] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Content type of the rendered exposition text.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

const NAMES_KEY: &str = "metrics:names";
const INF: &str = "Inf";

type LabelSet = BTreeMap<String, String>;

/// Encodes a label set into its canonical label key.
pub fn label_key(labels: &[(&str, &str)]) -> String {
    let set: LabelSet = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    encode_label_set(&set)
}

fn encode_label_set(set: &LabelSet) -> String {
    let json = serde_json::to_string(set).unwrap_or_else(|_| "{}".to_string());
    URL_SAFE_NO_PAD.encode(json)
}

/// Decodes a label key; anything undecodable yields an empty label set.
fn decode_label_key(lk: &str) -> LabelSet {
    URL_SAFE_NO_PAD
        .decode(lk)
        .ok()
        .and_then(|raw| serde_json::from_slice::<LabelSet>(&raw).ok())
        .unwrap_or_default()
}

fn format_bound(le: f64) -> String {
    le.to_string()
}

fn format_value(raw: Option<String>) -> String {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
        .to_string()
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "")
}

/// Renders `{k1="v1",k2="v2"}`, or nothing for an empty set.
fn render_labels(labels: &LabelSet) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();
    format!("{{{}}}", parts.join(","))
}

fn sample(name: &str, labels: &LabelSet, value: &str) -> String {
    format!("{}{} {}", name, render_labels(labels), value)
}

/// Accumulates counters and histograms and renders them as exposition text.
///
/// Cheap to clone; every component that emits metrics holds one.
#[derive(Clone)]
pub struct MetricsService {
    store: Arc<dyn MetricsStore>,
}

impl MetricsService {
    pub fn new(store: Arc<dyn MetricsStore>) -> Self {
        Self { store }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<dyn MetricsStore> {
        &self.store
    }

    /// Adds `value` to a counter and registers its label key and name.
    ///
    /// # Errors
    ///
    /// Returns the store error if any write fails.
    pub async fn counter_inc(
        &self,
        name: &str,
        labels: &[(&str, &str)],
        value: f64,
    ) -> MetricsResult<()> {
        let lk = label_key(labels);

        self.store
            .incr_by_float(&format!("metrics:cnt:{name}:{lk}"), value)
            .await?;
        self.store
            .set_add(&format!("metrics:idx:cnt:{name}"), &lk)
            .await?;
        self.store.set_add(NAMES_KEY, &format!("cnt:{name}")).await
    }

    /// Records one observation of `seconds` in a cumulative histogram.
    ///
    /// Every bucket whose bound is `>= seconds` is incremented, as is `+Inf`,
    /// so the `+Inf` bucket always equals the observation count.
    ///
    /// # Errors
    ///
    /// Returns the store error if any write fails.
    pub async fn histogram_observe(
        &self,
        name: &str,
        seconds: f64,
        labels: &[(&str, &str)],
        buckets: &[f64],
    ) -> MetricsResult<()> {
        let lk = label_key(labels);
        let mut bounds: Vec<f64> = buckets.iter().copied().filter(|b| b.is_finite()).collect();
        bounds.sort_by(f64::total_cmp);

        for le in bounds.iter().filter(|le| seconds <= **le) {
            let key = format!("metrics:hist:{name}:{}:{lk}", format_bound(*le));
            self.store.incr_by(&key, 1).await?;
        }
        self.store
            .incr_by(&format!("metrics:hist:{name}:{INF}:{lk}"), 1)
            .await?;
        self.store
            .incr_by_float(&format!("metrics:hist:sum:{name}:{lk}"), seconds)
            .await?;
        self.store
            .incr_by(&format!("metrics:hist:count:{name}:{lk}"), 1)
            .await?;

        self.store
            .set_add(&format!("metrics:idx:hist:{name}"), &lk)
            .await?;
        let buckets_key = format!("metrics:hist:buckets:{name}");
        for le in &bounds {
            self.store.set_add(&buckets_key, &format_bound(*le)).await?;
        }
        self.store.set_add(&buckets_key, INF).await?;

        self.store.set_add(NAMES_KEY, &format!("hist:{name}")).await
    }

    /// Records a latency observation with [`DEFAULT_BUCKETS`].
    ///
    /// # Errors
    ///
    /// Returns the store error if any write fails.
    pub async fn observe_seconds(
        &self,
        name: &str,
        seconds: f64,
        labels: &[(&str, &str)],
    ) -> MetricsResult<()> {
        self.histogram_observe(name, seconds, labels, &DEFAULT_BUCKETS)
            .await
    }

    /// Renders every registered metric as exposition text.
    ///
    /// Counters come first, then histograms; names and label sets are sorted
    /// so the output is stable between calls.
    ///
    /// # Errors
    ///
    /// Returns the store error if any read fails.
    pub async fn render(&self) -> MetricsResult<String> {
        let mut names = self.store.set_members(NAMES_KEY).await?;
        names.sort();

        let mut lines = Vec::new();

        for name in names.iter().filter_map(|m| m.strip_prefix("cnt:")) {
            lines.push(format!("# TYPE {name} counter"));

            for (lk, labels) in self.label_sets(&format!("metrics:idx:cnt:{name}")).await? {
                let Some(raw) = self.store.get(&format!("metrics:cnt:{name}:{lk}")).await? else {
                    continue;
                };
                lines.push(sample(name, &labels, &format_value(Some(raw))));
            }
        }

        for name in names.iter().filter_map(|m| m.strip_prefix("hist:")) {
            lines.push(format!("# TYPE {name} histogram"));

            let bounds = self.histogram_bounds(name).await?;

            for (lk, labels) in self.label_sets(&format!("metrics:idx:hist:{name}")).await? {
                for (segment, le) in &bounds {
                    let raw = self
                        .store
                        .get(&format!("metrics:hist:{name}:{segment}:{lk}"))
                        .await?;
                    let mut bucket_labels = labels.clone();
                    bucket_labels.insert("le".to_string(), le.clone());
                    lines.push(sample(
                        &format!("{name}_bucket"),
                        &bucket_labels,
                        &format_value(raw),
                    ));
                }

                let sum = self
                    .store
                    .get(&format!("metrics:hist:sum:{name}:{lk}"))
                    .await?;
                let count = self
                    .store
                    .get(&format!("metrics:hist:count:{name}:{lk}"))
                    .await?;
                lines.push(sample(&format!("{name}_sum"), &labels, &format_value(sum)));
                lines.push(sample(
                    &format!("{name}_count"),
                    &labels,
                    &format_value(count),
                ));
            }
        }

        let mut body = lines.join("\n");
        body.push('\n');
        Ok(body)
    }

    /// Label keys of one metric with their decoded sets, ordered by labels.
    async fn label_sets(&self, index_key: &str) -> MetricsResult<Vec<(String, LabelSet)>> {
        let mut sets: Vec<(String, LabelSet)> = self
            .store
            .set_members(index_key)
            .await?
            .into_iter()
            .map(|lk| {
                let labels = decode_label_key(&lk);
                (lk, labels)
            })
            .collect();
        sets.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(sets)
    }

    /// Bucket bounds as (key segment, `le` label), ascending with `+Inf` last.
    async fn histogram_bounds(&self, name: &str) -> MetricsResult<Vec<(String, String)>> {
        let mut numeric: Vec<(f64, String)> = self
            .store
            .set_members(&format!("metrics:hist:buckets:{name}"))
            .await?
            .into_iter()
            .filter(|b| b != INF)
            .filter_map(|b| b.parse::<f64>().ok().map(|v| (v, b)))
            .collect();
        numeric.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut bounds: Vec<(String, String)> = numeric
            .into_iter()
            .map(|(_, segment)| (segment.clone(), segment))
            .collect();
        bounds.push((INF.to_string(), "+Inf".to_string()));
        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::metrics::MemoryMetricsStore;

    fn service() -> MetricsService {
        MetricsService::new(Arc::new(MemoryMetricsStore::new()))
    }

    fn value_of(text: &str, prefix: &str) -> f64 {
        text.lines()
            .find(|l| l.starts_with(prefix))
            .and_then(|l| l.rsplit(' ').next())
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| panic!("no line starting with {prefix} in:\n{text}"))
    }

    #[test]
    fn test_label_key_ignores_insertion_order() {
        let a = label_key(&[("result", "ok"), ("method", "GET")]);
        let b = label_key(&[("method", "GET"), ("result", "ok")]);
        assert_eq!(a, b);
        assert!(!a.contains('=') && !a.contains('+') && !a.contains('/'));
        assert_ne!(a, label_key(&[("result", "ok")]));
    }

    #[test]
    fn test_label_key_decodes_back() {
        let lk = label_key(&[("b", "2"), ("a", "1")]);
        let set = decode_label_key(&lk);
        assert_eq!(set.get("a").map(String::as_str), Some("1"));
        assert_eq!(set.get("b").map(String::as_str), Some("2"));
        assert!(decode_label_key("!!!").is_empty());
    }

    #[test]
    fn test_render_labels_escapes_and_sorts() {
        let mut set = LabelSet::new();
        set.insert("z".to_string(), "a\"b".to_string());
        set.insert("a".to_string(), "c\\d\ne".to_string());
        assert_eq!(render_labels(&set), r#"{a="c\\de",z="a\"b"}"#);
        assert_eq!(render_labels(&LabelSet::new()), "");
    }

    #[tokio::test]
    async fn test_counter_render() {
        let metrics = service();
        metrics
            .counter_inc("redirect_requests_total", &[("result", "ok")], 1.0)
            .await
            .unwrap();
        metrics
            .counter_inc("redirect_requests_total", &[("result", "ok")], 1.0)
            .await
            .unwrap();
        metrics
            .counter_inc("redirect_requests_total", &[("result", "bad_sig")], 1.0)
            .await
            .unwrap();
        metrics.counter_inc("jobs_total", &[], 0.5).await.unwrap();

        let text = metrics.render().await.unwrap();
        let expected = "# TYPE jobs_total counter\n\
                        jobs_total 0.5\n\
                        # TYPE redirect_requests_total counter\n\
                        redirect_requests_total{result=\"bad_sig\"} 1\n\
                        redirect_requests_total{result=\"ok\"} 2\n";
        assert_eq!(text, expected);
    }

    #[tokio::test]
    async fn test_histogram_is_cumulative() {
        let metrics = service();
        metrics
            .observe_seconds("latency", 0.03, &[("result", "ok")])
            .await
            .unwrap();

        let text = metrics.render().await.unwrap();
        assert!(text.starts_with("# TYPE latency histogram\n"));
        assert_eq!(value_of(&text, "latency_bucket{le=\"0.025\""), 0.0);
        assert_eq!(value_of(&text, "latency_bucket{le=\"0.05\""), 1.0);
        assert_eq!(value_of(&text, "latency_bucket{le=\"5\""), 1.0);
        assert_eq!(value_of(&text, "latency_bucket{le=\"+Inf\""), 1.0);
        assert_eq!(value_of(&text, "latency_sum{"), 0.03);
        assert_eq!(value_of(&text, "latency_count{"), 1.0);
    }

    #[tokio::test]
    async fn test_histogram_invariants_hold() {
        let metrics = service();
        for seconds in [0.001, 0.2, 0.2, 3.0, 42.0, 0.01] {
            metrics.observe_seconds("h", seconds, &[]).await.unwrap();
        }

        let text = metrics.render().await.unwrap();
        let buckets: Vec<f64> = text
            .lines()
            .filter(|l| l.starts_with("h_bucket"))
            .map(|l| l.rsplit(' ').next().unwrap().parse().unwrap())
            .collect();

        assert_eq!(buckets.len(), DEFAULT_BUCKETS.len() + 1);
        assert!(buckets.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*buckets.last().unwrap(), value_of(&text, "h_count "));
        assert_eq!(value_of(&text, "h_count "), 6.0);
        assert_eq!(value_of(&text, "h_bucket{le=\"0.005\"}"), 1.0);
        assert_eq!(value_of(&text, "h_bucket{le=\"0.01\"}"), 2.0);
    }

    #[tokio::test]
    async fn test_histogram_bounds_sorted_with_inf_last() {
        let metrics = service();
        metrics
            .histogram_observe("custom", 0.7, &[], &[10.0, 0.5, 2.0])
            .await
            .unwrap();

        let text = metrics.render().await.unwrap();
        let les: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("custom_bucket"))
            .map(|l| l.split('"').nth(1).unwrap())
            .collect();
        assert_eq!(les, vec!["0.5", "2", "10", "+Inf"]);
    }

    #[tokio::test]
    async fn test_empty_store_renders_newline() {
        assert_eq!(service().render().await.unwrap(), "\n");
    }
}
