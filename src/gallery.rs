//! Gallery model: the template-facing view of a scanned site.
//!
//! Folds the scan result into the per-collection, per-slide data the page
//! templates consume. Everything here is string-building over already-known
//! paths — a pure function of the scan and the config. It runs only after
//! the build plan has fully executed, so every href a slide carries points
//! at a file that exists in the output tree.

use crate::config::Config;
use crate::scan::{Gallery, MediaKind};

/// One resolution variant of a photo slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSource {
    pub size: u32,
    pub href: String,
}

/// One codec variant of a video slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSource {
    pub codec: String,
    pub mime: String,
    pub href: String,
}

/// A template-facing descriptor of one photo or video.
#[derive(Debug, Clone)]
pub enum Slide {
    Photo {
        stem: String,
        /// In ascending configured size order.
        sources: Vec<PhotoSource>,
    },
    Video {
        stem: String,
        sources: Vec<VideoSource>,
    },
}

/// One collection as the templates see it.
#[derive(Debug, Clone)]
pub struct CollectionModel {
    pub title: String,
    pub slug: String,
    /// Absolute href of the collection's page, ending in `/`.
    pub href: String,
    /// Download link for the originals archive, when enabled.
    pub archive_href: Option<String>,
    pub slides: Vec<Slide>,
}

/// The site-wide bundle: ordered collections plus free-form variables.
#[derive(Debug, Clone)]
pub struct SiteModel {
    /// Normalized to begin and end with `/`.
    pub base_url: String,
    pub collections: Vec<CollectionModel>,
    vars: std::collections::BTreeMap<String, String>,
}

impl SiteModel {
    pub fn title(&self) -> &str {
        self.var("gallery_title").unwrap_or("Gallery")
    }

    pub fn description(&self) -> Option<&str> {
        self.var("gallery_description")
    }

    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn stylesheet_href(&self) -> String {
        format!("{}assets/gallery.css", self.base_url)
    }
}

/// Build the template bundle from a scanned gallery.
pub fn build(gallery: &Gallery, config: &Config) -> SiteModel {
    let base_url = config.base_url();

    let collections = gallery
        .collections
        .iter()
        .map(|collection| {
            let collection_base = format!("{base_url}collections/{}/", collection.slug);
            let slides = collection
                .media
                .iter()
                .map(|media| match media.kind {
                    MediaKind::Photo => Slide::Photo {
                        stem: media.stem.clone(),
                        sources: config
                            .media
                            .thumbnail_sizes
                            .iter()
                            .map(|&size| PhotoSource {
                                size,
                                href: format!("{collection_base}{}/{size}px.jpg", media.stem),
                            })
                            .collect(),
                    },
                    MediaKind::Video => Slide::Video {
                        stem: media.stem.clone(),
                        sources: config
                            .media
                            .video_codecs
                            .iter()
                            .map(|codec| VideoSource {
                                codec: codec.clone(),
                                mime: format!("video/{codec}"),
                                href: format!("{collection_base}{}/video.{codec}", media.stem),
                            })
                            .collect(),
                    },
                })
                .collect();

            let archive_href = config
                .gallery
                .downloadable_archives
                .then(|| format!("{collection_base}{}.zip", collection.slug));

            CollectionModel {
                title: collection.title.clone(),
                slug: collection.slug.clone(),
                href: collection_base,
                archive_href,
                slides,
            }
        })
        .collect();

    SiteModel {
        base_url,
        collections,
        vars: config.template_vars.clone(),
    }
}
