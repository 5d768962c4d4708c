//! HTML page rendering.
//!
//! Writes the landing page and one page per collection from the
//! [`SiteModel`]. Pages are generated with [maud](https://maud.lambda.xyz/)
//! — compile-time checked, auto-escaped HTML as Rust code — so rendering is
//! a pure function of the model with no template files to load at runtime.
//!
//! ## Generated Pages
//!
//! - `index.html` — the landing page, showing the first collection in
//!   natural-sort order as the home view
//! - `collections/<slug>/index.html` — one page per collection
//!
//! Photo slides emit an `<img>` with a `srcset` over all generated sizes;
//! video slides emit a `<video>` with one `<source>` per codec. Rendering
//! runs only after the build plan completed, so every referenced asset
//! exists on disk by the time a page mentions it.

use crate::gallery::{CollectionModel, SiteModel, Slide};
use maud::{DOCTYPE, Markup, html};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Render the landing page and every collection page into the output tree.
///
/// Returns the number of pages written.
pub fn render_site(model: &SiteModel, output_root: &Path) -> Result<usize, RenderError> {
    fs::create_dir_all(output_root)?;

    // The landing page reuses the first collection as the home view.
    let landing = page(model, model.collections.first());
    fs::write(output_root.join("index.html"), landing.into_string())?;
    let mut pages = 1;

    for collection in &model.collections {
        let dir = output_root.join("collections").join(&collection.slug);
        fs::create_dir_all(&dir)?;
        let markup = page(model, Some(collection));
        fs::write(dir.join("index.html"), markup.into_string())?;
        pages += 1;
    }

    Ok(pages)
}

/// One full gallery page, with `current` highlighted and its slides shown.
fn page(model: &SiteModel, current: Option<&CollectionModel>) -> Markup {
    let page_title = match current {
        Some(c) => format!("{} — {}", c.title, model.title()),
        None => model.title().to_string(),
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (page_title) }
                link rel="stylesheet" href=(model.stylesheet_href());
            }
            body {
                header {
                    h1 { a href=(model.base_url) { (model.title()) } }
                    @if let Some(description) = model.description() {
                        p { (description) }
                    }
                    (collection_nav(model, current))
                }
                main class="slides" {
                    @if let Some(collection) = current {
                        @for slide in &collection.slides {
                            (render_slide(slide))
                        }
                        @if let Some(archive) = &collection.archive_href {
                            a class="archive" href=(archive) {
                                "Download all originals (" (collection.title) ")"
                            }
                        }
                    }
                }
            }
        }
    }
}

fn collection_nav(model: &SiteModel, current: Option<&CollectionModel>) -> Markup {
    let current_slug = current.map(|c| c.slug.as_str());
    html! {
        nav class="collections" {
            ul {
                @for collection in &model.collections {
                    li class=[(current_slug == Some(collection.slug.as_str())).then_some("current")] {
                        a href=(collection.href) { (collection.title) }
                    }
                }
            }
        }
    }
}

fn render_slide(slide: &Slide) -> Markup {
    match slide {
        Slide::Photo { stem, sources } => {
            let srcset = sources
                .iter()
                .map(|s| format!("{} {}w", s.href, s.size))
                .collect::<Vec<_>>()
                .join(", ");
            // The largest variant doubles as the plain src fallback.
            let fallback = sources.last().map(|s| s.href.as_str()).unwrap_or_default();
            html! {
                figure {
                    img src=(fallback) srcset=(srcset) alt=(stem) loading="lazy";
                }
            }
        }
        Slide::Video { stem, sources } => html! {
            figure {
                video controls preload="metadata" title=(stem) {
                    @for source in sources {
                        source src=(source.href) type=(source.mime);
                    }
                }
            }
        },
    }
}
