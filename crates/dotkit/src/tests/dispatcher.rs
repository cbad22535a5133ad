use crate::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// SVG prologue as emitted by graphviz 2.40.1 for `graph g {a--b}`.
const STANDALONE_SVG: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n\
<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\"\n \
\"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n\
<!-- Generated by graphviz version 2.40.1 (20161225.0304)\n -->\n\
<!-- Title: g Pages: 1 -->\n\
<svg width=\"62pt\" height=\"116pt\"></svg>\n";

fn tagged_engine(tag: &'static str, calls: Arc<AtomicUsize>) -> InProcessEngine {
    InProcessEngine::from_fn(move |req| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Rendered::new(
            req.format,
            format!("{tag}:{}", req.source).into_bytes(),
        ))
    })
}

#[test]
fn render_without_engine_fails_fast() {
    let gv = Graphviz::new();
    let err = gv.render("graph g {a--b}", Format::Svg).unwrap_err();
    assert!(matches!(err, Error::NoEngineConfigured), "got {err:?}");
}

#[test]
fn render_routes_to_installed_engine() {
    let calls = Arc::new(AtomicUsize::new(0));
    let gv = Graphviz::with_engine(tagged_engine("a", calls.clone()));
    let out = gv.from_string("graph g {a--b}").render(Format::Dot).unwrap();
    assert_eq!(out.as_str().unwrap(), "a:graph g {a--b}");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn switching_engines_uses_the_new_engine_exclusively() {
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));

    let mut gv = Graphviz::with_engine(tagged_engine("first", first_calls.clone()));
    gv.render("graph g {}", Format::Dot).unwrap();

    gv.use_engine(Some(Arc::new(tagged_engine(
        "second",
        second_calls.clone(),
    ))));
    let out = gv.render("graph g {}", Format::Dot).unwrap();

    assert_eq!(out.as_str().unwrap(), "second:graph g {}");
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn clearing_engine_returns_to_fail_fast_state() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut gv = Graphviz::with_engine(tagged_engine("a", calls.clone()));
    gv.use_engine(None);
    let err = gv.render("graph g {}", Format::Svg).unwrap_err();
    assert!(matches!(err, Error::NoEngineConfigured), "got {err:?}");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn svg_output_is_trimmed_to_the_svg_element() {
    let gv = Graphviz::with_engine(InProcessEngine::from_fn(|req| {
        Ok(Rendered::new(req.format, STANDALONE_SVG.as_bytes().to_vec()))
    }));

    let inline = gv.render("graph g {a--b}", Format::Svg).unwrap();
    assert!(inline.as_str().unwrap().starts_with("<svg"));

    let standalone = gv.render("graph g {a--b}", Format::SvgStandalone).unwrap();
    assert_eq!(standalone.as_str().unwrap(), STANDALONE_SVG);
    assert!(
        standalone
            .as_str()
            .unwrap()
            .starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>")
    );
}

#[test]
fn engine_errors_propagate_untranslated() {
    let gv = Graphviz::with_engine(InProcessEngine::from_fn(|_| {
        Err(Error::Render {
            message: "renderer unavailable".to_string(),
        })
    }));
    let err = gv.render("graph g {}", Format::Svg).unwrap_err();
    assert!(
        matches!(&err, Error::Render { message } if message.as_str() == "renderer unavailable"),
        "got {err:?}"
    );
}

#[test]
fn in_process_panic_is_reported_as_error() {
    let gv = Graphviz::with_engine(InProcessEngine::from_fn(|_| panic!("boom")));
    let err = gv.render("graph g {}", Format::Svg).unwrap_err();
    assert!(matches!(err, Error::Render { .. }), "got {err:?}");
}
