use super::*;

const SUBJECT_HTML: &str = r#"<html><head>
<script type="application/ld+json">
{
  "@context": "http://schema.org",
  "name": "肖申克的救赎 The Shawshank Redemption",
  "url": "/subject/1292052/",
  "image": "https://img2.doubanio.com/view/photo/s_ratio_poster/public/p480747492.jpg",
  "director": [
    { "@type": "Person", "url": "/celebrity/1047973/", "name": "弗兰克·德拉邦特 Frank Darabont" },
    { "@type": "Person", "url": "", "name": "Uncredited" }
  ],
  "genre": ["剧情", "犯罪"],
  "description": "一场谋杀案使银行家安迪蒙冤入狱。",
  "@type": "Movie",
  "aggregateRating": { "@type": "AggregateRating", "ratingCount": "3000000", "ratingValue": "9.7" }
}
</script>
</head><body>
<div id="link-report-intra">
  <span property="v:summary" class="">
    一场谋杀案使银行家安迪（蒂姆·罗宾斯 Tim Robbins 饰）蒙冤入狱，<br />
    谋杀妻子及其情人的指控将囚禁他终生。
  </span>
</div>
<div class="gray_ad">
  <ul class="bs">
    <li><a class="playBtn" href="https://v.qq.com/x">腾讯视频</a><span>VIP免费观看</span></li>
    <li><a class="playBtn" href="https://www.iqiyi.com/x"> 爱奇艺视频 </a></li>
    <li><a class="playBtn" href="https://www.mgtv.com/x">芒果TV</a></li>
  </ul>
</div>
</body></html>"#;

#[test]
fn test_extract_subject_ids_dedupes_in_order() {
    let html = r#"
        <a href="https://movie.douban.com/subject/1292052/">x</a>
        <a href="https://movie.douban.com/subject/1291546/"><img></a>
        <a href="https://movie.douban.com/subject/1292052/">again</a>
        <a href="https://movie.douban.com/subject/">broken</a>
    "#;
    assert_eq!(extract_subject_ids(html), vec!["1292052", "1291546"]);
}

#[test]
fn test_parse_subject_core_fields() {
    let detail = parse_subject("1292052", SUBJECT_HTML).unwrap();
    assert_eq!(detail.title, "肖申克的救赎 The Shawshank Redemption");
    assert_eq!(detail.kind, ItemKind::Movie);
    assert_eq!(detail.categories, vec!["剧情", "犯罪"]);
    assert_eq!(detail.rating.normalized(), 9.7);
    assert_eq!(
        detail.cover.as_deref(),
        Some("https://img2.doubanio.com/view/photo/s_ratio_poster/public/p480747492.jpg")
    );
}

#[test]
fn test_parse_subject_prefers_longer_summary() {
    let detail = parse_subject("1292052", SUBJECT_HTML).unwrap();
    assert!(detail.intro.starts_with("一场谋杀案使银行家安迪（蒂姆·罗宾斯"));
    assert!(detail.intro.ends_with("将囚禁他终生。"));
    assert!(!detail.intro.contains('\n'));
}

#[test]
fn test_parse_subject_directors_keep_celebrity_id() {
    let detail = parse_subject("1292052", SUBJECT_HTML).unwrap();
    assert_eq!(detail.authors.len(), 2);
    assert_eq!(detail.authors[0].author_id.as_deref(), Some("1047973"));
    assert_eq!(detail.authors[1].author_id, None);
}

#[test]
fn test_parse_subject_sources_drop_suffix() {
    let detail = parse_subject("1292052", SUBJECT_HTML).unwrap();
    assert_eq!(detail.sources, vec!["腾讯", "爱奇艺", "芒果"]);
}

#[test]
fn test_parse_series_without_rating() {
    let html = r#"<script type="application/ld+json">{"name":"Show","@type":"TVSeries","genre":"剧情","description":"d","aggregateRating":{"ratingValue":""}}</script>"#;
    let detail = parse_subject("1", html).unwrap();
    assert_eq!(detail.kind, ItemKind::Series);
    assert_eq!(detail.categories, vec!["剧情"]);
    assert_eq!(detail.rating.normalized(), 0.0);
    assert!(detail.sources.is_empty());
    assert_eq!(detail.intro, "d");
}

#[test]
fn test_parse_subject_without_json_ld() {
    assert!(matches!(
        parse_subject("1", "<html></html>"),
        Err(SourceError::Parse(_))
    ));
}

#[test]
fn test_strip_first_suffix() {
    assert_eq!(strip_first_suffix("腾讯视频"), "腾讯");
    assert_eq!(strip_first_suffix("芒果TV视频"), "芒果视频");
    assert_eq!(strip_first_suffix("哔哩哔哩"), "哔哩哔哩");
}
