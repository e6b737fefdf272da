use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use tempfile::tempdir;
use url::Url;

use amesc::content_store::{relative_href, AssetCategory, ContentStore};
use amesc::css_rewriter::find_urls;
use amesc::url_resolver::resolve_against;
use amesc::{strip_scripts, Document};

fn bench_path_for(c: &mut Criterion) {
    let temp_dir = tempdir().unwrap();
    let store = ContentStore::new(temp_dir.path()).unwrap();
    let urls: Vec<Url> = (0..32)
        .map(|i| Url::parse(&format!("https://example.com/images/{i}.png")).unwrap())
        .collect();

    c.bench_function("path_for", |b| {
        b.iter(|| {
            for url in &urls {
                let path = store.path_for(black_box(url), AssetCategory::Image);
                let _href = relative_href(&path, store.root());
            }
        });
    });
}

fn bench_resolve(c: &mut Criterion) {
    let page = Url::parse("https://example.com/blog/page-1.html").unwrap();
    let references = [
        "images/photo.jpg",
        "/static/logo.png",
        "//cdn.example.com/banner.gif?v=3",
        "https://other.example/x.jpeg",
    ];

    c.bench_function("resolve_references", |b| {
        b.iter(|| {
            for reference in &references {
                let _url = resolve_against(black_box(reference), &page).unwrap();
            }
        });
    });
}

fn bench_css_scan(c: &mut Criterion) {
    let rule = r#".a { background: url("https://example.com/bg.png") } .b { background: url('img/x.gif') } .c { color: red }
"#;
    let css = rule.repeat(200);

    c.bench_function("scan_css_urls", |b| {
        b.iter(|| {
            let _found = find_urls(black_box(css.as_bytes()));
        });
    });
}

fn bench_parse_strip_serialize(c: &mut Criterion) {
    let html = r#"
        <html>
            <head>
                <link rel="stylesheet" href="/style.css">
                <script src="/script.js">var a = 1;</script>
            </head>
            <body>
                <img src="/logo.png" alt="Logo">
                <img src="/banner.jpg" alt="Banner">
                <script>track();</script>
                <p>Body text</p>
            </body>
        </html>
    "#;

    c.bench_function("parse_strip_serialize", |b| {
        b.iter(|| {
            let document = Document::parse(black_box(html.as_bytes()));
            strip_scripts(&document);
            let _out = document.to_html().unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_path_for,
    bench_resolve,
    bench_css_scan,
    bench_parse_strip_serialize
);
criterion_main!(benches);
