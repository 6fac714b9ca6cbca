use crate::models::weekly::{
    ActivityLevel, ClientHealth, ClientSearchHit, DateRange, DatedLine, HealthStatus, IncidentDigest,
    KeywordSearchHit, PersonnelDigest, ProductProgress, WeeklyEntry,
};
use crate::analysis::distribution::round2;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyConfig {
    pub known_clients: Vec<String>,
    pub product_lines: Vec<String>,
    pub incident_keywords: Vec<String>,
    pub personnel_keywords: Vec<String>,
    pub privatization_marker: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for WeeklyConfig {
    fn default() -> Self {
        Self {
            known_clients: owned(&[
                "滴滴", "OPPO", "oppo", "好未来", "京东", "微众银行", "招商金科", "格力", "TCL",
                "新华三", "长亮科技", "云鲸智能", "作业帮", "边锋游戏", "唯品会", "网易", "米哈游",
                "小红书", "百度", "喜马拉雅", "广东电信", "中信建投", "天翼云盘", "中电量子",
                "苏州公安", "苏州国发", "猿辅导", "乐信", "九江银行", "招商基金", "跨越速运",
                "中广核", "华为", "博纳", "中船", "海信", "蓝信", "卡斯柯", "宜宾辰海",
                "武汉铁路局", "四川准则",
            ]),
            product_lines: owned(&[
                "Drive", "应用表格", "轻文档", "专业文档", "表格计算", "极速SDK", "流程图", "AI",
                "协同编辑", "导入导出",
            ]),
            incident_keywords: owned(&[
                "故障", "问题", "bug", "Bug", "BUG", "异常", "失败", "报错", "P0", "P1", "P2",
            ]),
            personnel_keywords: owned(&["人员", "离职", "入职", "调整", "组长", "负责人"]),
            privatization_marker: "私有化".to_string(),
        }
    }
}

fn date_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#{1,2}\s*(\d{8})").expect("date header regex"))
}

/// Splits a weekly report at `# YYYYMMDD` / `## YYYYMMDD` headers. Text before
/// the first header is ignored.
pub fn parse_report(content: &str, config: &WeeklyConfig) -> Vec<WeeklyEntry> {
    let headers: Vec<(String, usize, usize)> = date_header_regex()
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let date = caps.get(1)?;
            Some((date.as_str().to_string(), whole.start(), whole.end()))
        })
        .collect();

    headers
        .iter()
        .enumerate()
        .map(|(idx, (date, _, body_start))| {
            let body_end = headers
                .get(idx + 1)
                .map(|(_, next_start, _)| *next_start)
                .unwrap_or(content.len());
            parse_section(date, &content[*body_start..body_end], config)
        })
        .collect()
}

fn long_enough(line: &str, min_exclusive: usize) -> bool {
    line.chars().count() > min_exclusive
}

pub fn parse_section(date: &str, content: &str, config: &WeeklyConfig) -> WeeklyEntry {
    let mut entry = WeeklyEntry {
        date: date.to_string(),
        raw_content: content.to_string(),
        ..WeeklyEntry::default()
    };

    for client in &config.known_clients {
        if content.contains(client.as_str()) {
            entry.clients.insert(client.clone());
        }
    }

    for line in content.split('\n') {
        let trimmed = line.trim();
        if long_enough(trimmed, 5)
            && config.incident_keywords.iter().any(|kw| line.contains(kw.as_str()))
        {
            entry.incidents.push(trimmed.to_string());
        }
        if config.personnel_keywords.iter().any(|kw| line.contains(kw.as_str())) {
            entry.personnel.push(trimmed.to_string());
        }
    }

    for product in &config.product_lines {
        let lines: Vec<String> = content
            .split('\n')
            .filter(|line| line.contains(product.as_str()))
            .map(str::trim)
            .filter(|line| long_enough(line, 5))
            .map(str::to_string)
            .collect();
        if !lines.is_empty() {
            entry.products.insert(product.clone(), lines);
        }
    }

    if content.contains(config.privatization_marker.as_str()) {
        entry.privatization = bullet_section(content, &config.privatization_marker)
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
    }

    entry
}

/// Byte offset just past `*` and any following whitespace, if `idx` holds a `*`.
fn bullet_body(content: &str, idx: usize) -> Option<usize> {
    let rest = content.get(idx..)?;
    let after_star = rest.strip_prefix('*')?;
    let body = after_star.trim_start();
    Some(content.len() - body.len())
}

fn starts_heading_word(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || ('\u{4e00}'..='\u{9fff}').contains(&c))
}

/// The bullet block that opens with `* <marker>` and runs until the next bullet
/// whose text starts with a letter or CJK character.
fn bullet_section<'a>(content: &'a str, marker: &str) -> &'a str {
    let Some((start, marker_end)) = content
        .match_indices('*')
        .filter_map(|(idx, _)| {
            let body = bullet_body(content, idx)?;
            content[body..]
                .starts_with(marker)
                .then(|| (idx, body + marker.len()))
        })
        .next()
    else {
        return "";
    };

    let end = content[marker_end..]
        .match_indices('*')
        .map(|(offset, _)| marker_end + offset)
        .find(|idx| {
            bullet_body(content, *idx).is_some_and(|body| starts_heading_word(&content[body..]))
        })
        .unwrap_or(content.len());

    &content[start..end]
}

pub fn date_range(entries: &[WeeklyEntry]) -> DateRange {
    DateRange {
        start: entries.iter().map(|e| e.date.clone()).min(),
        end: entries.iter().map(|e| e.date.clone()).max(),
    }
}

/// Health per client ever mentioned, ordered by mentions descending then name.
pub fn client_health(entries: &[WeeklyEntry]) -> Vec<ClientHealth> {
    let mut mentions: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        for client in &entry.clients {
            *mentions.entry(client.as_str()).or_default() += 1;
        }
    }

    let mut health: Vec<ClientHealth> = mentions
        .into_iter()
        .map(|(client, total_mentions)| {
            let incident_count = entries
                .iter()
                .filter(|e| e.clients.contains(client))
                .flat_map(|e| e.incidents.iter())
                .filter(|line| line.contains(client))
                .count();
            let ratio = incident_count as f64 / total_mentions.max(1) as f64;
            ClientHealth {
                client: client.to_string(),
                total_mentions,
                incident_count,
                incident_ratio: round2(ratio),
                health_status: HealthStatus::from_ratio(ratio),
            }
        })
        .collect();

    health.sort_by(|a, b| b.total_mentions.cmp(&a.total_mentions));
    health
}

pub fn product_progress(entries: &[WeeklyEntry], config: &WeeklyConfig) -> Vec<ProductProgress> {
    config
        .product_lines
        .iter()
        .map(|product| {
            let mut weekly_mentions = 0;
            let mut activities: Vec<(String, String)> = Vec::new();
            for entry in entries {
                if let Some(lines) = entry.products.get(product) {
                    weekly_mentions += 1;
                    activities.extend(lines.iter().take(3).map(|l| (entry.date.clone(), l.clone())));
                }
            }
            let keep_from = activities.len().saturating_sub(5);
            ProductProgress {
                product: product.clone(),
                weekly_mentions,
                activity_level: ActivityLevel::from_mentions(weekly_mentions),
                recent_activities: activities.split_off(keep_from),
            }
        })
        .collect()
}

pub fn incident_digest(entries: &[WeeklyEntry]) -> IncidentDigest {
    let mut all: Vec<DatedLine> = Vec::new();
    let mut monthly: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_client: Vec<(String, usize)> = Vec::new();

    for entry in entries {
        let month_key = format!(
            "{}-{}",
            entry.date.get(..4).unwrap_or(""),
            entry.date.get(4..6).unwrap_or("")
        );
        for line in &entry.incidents {
            all.push(DatedLine {
                date: entry.date.clone(),
                text: line.chars().take(100).collect(),
            });
            *monthly.entry(month_key.clone()).or_default() += 1;

            for client in entry.clients.iter().filter(|c| line.contains(c.as_str())) {
                match by_client.iter_mut().find(|(name, _)| name == client) {
                    Some((_, count)) => *count += 1,
                    None => by_client.push((client.clone(), 1)),
                }
            }
        }
    }

    by_client.sort_by(|a, b| b.1.cmp(&a.1));
    by_client.truncate(10);
    let total_incidents = all.len();
    let recent_incidents = all.split_off(total_incidents.saturating_sub(10));

    IncidentDigest {
        total_incidents,
        monthly_distribution: monthly,
        client_incidents: by_client,
        recent_incidents,
    }
}

pub fn personnel_digest(entries: &[WeeklyEntry]) -> PersonnelDigest {
    let events: Vec<DatedLine> = entries
        .iter()
        .flat_map(|entry| {
            entry
                .personnel
                .iter()
                .filter(|event| long_enough(event, 3))
                .map(|event| DatedLine {
                    date: entry.date.clone(),
                    text: event.clone(),
                })
        })
        .collect();

    PersonnelDigest {
        total_events: events.len(),
        events,
    }
}

fn matching_lines(content: &str, needle: &str) -> Vec<String> {
    content
        .split('\n')
        .filter(|line| line.contains(needle))
        .map(|line| line.trim().to_string())
        .take(10)
        .collect()
}

pub fn search_by_client(entries: &[WeeklyEntry], client: &str) -> Vec<ClientSearchHit> {
    entries
        .iter()
        .filter(|entry| entry.raw_content.contains(client))
        .map(|entry| ClientSearchHit {
            date: entry.date.clone(),
            incidents: entry
                .incidents
                .iter()
                .filter(|line| line.contains(client))
                .cloned()
                .collect(),
            relevant_content: matching_lines(&entry.raw_content, client),
        })
        .collect()
}

pub fn search_by_keyword(entries: &[WeeklyEntry], keyword: &str) -> Vec<KeywordSearchHit> {
    entries
        .iter()
        .filter(|entry| entry.raw_content.contains(keyword))
        .map(|entry| KeywordSearchHit {
            date: entry.date.clone(),
            matches: matching_lines(&entry.raw_content, keyword),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
周报汇总

## 20250107
* 私有化
  - 滴滴 私有化部署升级完成
  - 滴滴 文档导出报错，已修复
* Drive
  - Drive 新版上传组件上线
人员调整：张三 入职

# 20250114
* 好未来 巡检正常
* 应用表格 性能优化进行中
";

    fn entries() -> Vec<WeeklyEntry> {
        parse_report(REPORT, &WeeklyConfig::default())
    }

    #[test]
    fn splits_on_date_headers() {
        let entries = entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, "20250107");
        assert_eq!(entries[1].date, "20250114");
        assert!(!entries[0].raw_content.contains("周报汇总"));
        assert!(entries[1].raw_content.contains("好未来"));
    }

    #[test]
    fn ignores_deeper_headings() {
        let parsed = parse_report("### 20250101\n内容\n", &WeeklyConfig::default());
        assert!(parsed.is_empty());
    }

    #[test]
    fn section_extracts_clients_incidents_products_and_personnel() {
        let first = &entries()[0];
        assert!(first.clients.contains("滴滴"));
        assert_eq!(first.incidents, vec!["- 滴滴 文档导出报错，已修复"]);
        assert_eq!(first.products["Drive"], vec!["* Drive", "- Drive 新版上传组件上线"]);
        assert_eq!(first.personnel, vec!["人员调整：张三 入职"]);
    }

    #[test]
    fn privatization_block_stops_at_next_top_level_bullet() {
        let first = &entries()[0];
        assert_eq!(
            first.privatization,
            vec!["* 私有化", "- 滴滴 私有化部署升级完成", "- 滴滴 文档导出报错，已修复"]
        );
        assert!(entries()[1].privatization.is_empty());

        let nested = parse_section("20250101", "* 私有化\n  * 滴滴 升级\n", &WeeklyConfig::default());
        assert_eq!(nested.privatization, vec!["* 私有化"]);
    }

    #[test]
    fn client_health_uses_incident_ratio() {
        let health = client_health(&entries());
        let didi = health.iter().find(|h| h.client == "滴滴").expect("didi");
        assert_eq!(didi.total_mentions, 1);
        assert_eq!(didi.incident_count, 1);
        assert_eq!(didi.incident_ratio, 1.0);
        assert_eq!(didi.health_status, HealthStatus::Critical);

        let tal = health.iter().find(|h| h.client == "好未来").expect("tal");
        assert_eq!(tal.health_status, HealthStatus::Healthy);
    }

    #[test]
    fn digests_and_searches() {
        let entries = entries();
        let incidents = incident_digest(&entries);
        assert_eq!(incidents.total_incidents, 1);
        assert_eq!(incidents.monthly_distribution.get("2025-01"), Some(&1));
        assert_eq!(incidents.client_incidents, vec![("滴滴".to_string(), 1)]);

        let products = product_progress(&entries, &WeeklyConfig::default());
        let drive = products.iter().find(|p| p.product == "Drive").expect("drive");
        assert_eq!(drive.weekly_mentions, 1);
        assert_eq!(drive.activity_level, ActivityLevel::Low);

        assert_eq!(personnel_digest(&entries).total_events, 1);
        assert_eq!(search_by_client(&entries, "好未来").len(), 1);
        let hits = search_by_keyword(&entries, "Drive");
        assert_eq!(hits[0].matches.len(), 2);

        let range = date_range(&entries);
        assert_eq!(range.start.as_deref(), Some("20250107"));
        assert_eq!(range.end.as_deref(), Some("20250114"));
    }
}
