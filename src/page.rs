//! Document snapshots handed to the scanner.
//!
//! A `Page` owns the parsed tree of one document plus the documents of its
//! embedded frames. The pipeline never reads ambient state: everything a scan
//! sees is reachable from the `Page` passed in.

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::dom::{self, Document, Selection};
use crate::encoding::decode_snapshot;
use crate::error::{Error, Result};

/// Frames nested deeper than this are not followed.
pub const MAX_FRAME_DEPTH: usize = 4;

/// A parsed document together with its URL and embedded frame documents.
pub struct Page {
    document: Document,
    url: Option<Url>,
    /// Documents of `<iframe srcdoc>` elements, in document order.
    inline_frames: Vec<Page>,
    /// Documents attached by the host, keyed by resolved frame URL.
    attached: HashMap<String, Page>,
}

/// One document reachable from a page, the top-level document included.
#[derive(Clone)]
pub struct Frame<'a> {
    /// Position in scan order; `0` is the top-level document.
    pub index: usize,
    /// The frame's `src` as written, `None` for the top level and `srcdoc` frames.
    pub src: Option<String>,
    /// The frame's document.
    pub page: &'a Page,
}

impl Page {
    /// Parse a snapshot without a known URL.
    ///
    /// # Example
    ///
    /// ```rust
    /// use artifact_sync::Page;
    ///
    /// let page = Page::parse("<html><head><title>Chat</title></head><body></body></html>");
    /// assert_eq!(page.title().as_deref(), Some("Chat"));
    /// ```
    #[must_use]
    pub fn parse(html: &str) -> Self {
        Self::build(html, None, 0)
    }

    /// Parse a snapshot taken at `url`. An unparseable URL is ignored.
    #[must_use]
    pub fn with_url(html: &str, url: &str) -> Self {
        Self::build(html, Url::parse(url).ok(), 0)
    }

    /// Parse raw snapshot bytes, honouring a declared `<meta charset>`.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], url: Option<&str>) -> Self {
        let html = decode_snapshot(bytes);
        Self::build(&html, url.and_then(|u| Url::parse(u).ok()), 0)
    }

    fn build(html: &str, url: Option<Url>, depth: usize) -> Self {
        let document = dom::parse(html);
        let mut inline_frames = Vec::new();
        if depth < MAX_FRAME_DEPTH {
            for frame in document.select("iframe[srcdoc]").iter() {
                let srcdoc = dom::get_attribute(&frame, "srcdoc").unwrap_or_default();
                // srcdoc documents share the embedding document's origin
                inline_frames.push(Self::build(&srcdoc, url.clone(), depth + 1));
            }
        }
        Self {
            document,
            url,
            inline_frames,
            attached: HashMap::new(),
        }
    }

    /// Attach the document of an embedded frame.
    ///
    /// `src` is resolved against this page's URL the same way the scanner
    /// resolves `<iframe src>`.
    ///
    /// # Errors
    ///
    /// Returns `Error::FrameError` when `src` cannot be resolved to an
    /// absolute URL.
    pub fn attach_frame(&mut self, src: &str, page: Page) -> Result<()> {
        let resolved = self.resolve(src)?;
        self.attached.insert(frame_key(&resolved), page);
        Ok(())
    }

    /// The parsed document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The root element selection.
    #[must_use]
    pub fn root(&self) -> Selection<'_> {
        self.document.select("html")
    }

    /// URL the snapshot was taken at, if known.
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Trimmed `<title>` text, if present and non-empty.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        let title = dom::text_content(&self.document.select("title")).trim().to_string();
        (!title.is_empty()).then_some(title)
    }

    /// Every document reachable from this page in scan order: the page
    /// itself, then each readable frame followed by its own frames.
    ///
    /// Frames that are cross-origin, unresolvable or not attached are logged
    /// and skipped.
    #[must_use]
    pub fn frames(&self) -> Vec<Frame<'_>> {
        let mut out = vec![Frame {
            index: 0,
            src: None,
            page: self,
        }];
        self.collect_frames(0, &mut out);
        out
    }

    fn collect_frames<'a>(&'a self, depth: usize, out: &mut Vec<Frame<'a>>) {
        if depth >= MAX_FRAME_DEPTH {
            return;
        }
        let mut inline = self.inline_frames.iter();
        for frame in self.document.select("iframe").iter() {
            let (src, child) = if dom::has_attribute(&frame, "srcdoc") {
                (None, inline.next())
            } else {
                match self.attached_frame(&frame) {
                    Ok(page) => (dom::get_attribute(&frame, "src"), Some(page)),
                    Err(err) => {
                        tracing::debug!(error = %err, "skipping frame");
                        continue;
                    }
                }
            };
            if let Some(page) = child {
                out.push(Frame {
                    index: out.len(),
                    src,
                    page,
                });
                page.collect_frames(depth + 1, out);
            }
        }
    }

    /// Look up the attached document for an `<iframe src>` element.
    fn attached_frame(&self, frame: &Selection) -> Result<&Page> {
        let src = dom::get_attribute(frame, "src").unwrap_or_default();
        let resolved = self.resolve(&src)?;
        if let Some(base) = &self.url {
            if base.origin() != resolved.origin() {
                return Err(Error::FrameError {
                    src,
                    reason: "cross-origin".to_string(),
                });
            }
        }
        self.attached
            .get(&frame_key(&resolved))
            .ok_or_else(|| Error::FrameError {
                src,
                reason: "document not attached".to_string(),
            })
    }

    fn resolve(&self, src: &str) -> Result<Url> {
        let src = src.trim();
        if src.is_empty() || src == "about:blank" {
            return Err(Error::FrameError {
                src: src.to_string(),
                reason: "no document source".to_string(),
            });
        }
        let joined = match &self.url {
            Some(base) => base.join(src),
            None => Url::parse(src),
        };
        joined.map_err(|e| Error::FrameError {
            src: src.to_string(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("inline_frames", &self.inline_frames.len())
            .field("attached", &self.attached.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Attached frames are looked up without their fragment.
fn frame_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srcdoc_frames_are_parsed_in_place() {
        let page = Page::parse(
            r#"<body><iframe srcdoc="<pre id='inner'>print(1)</pre>"></iframe></body>"#,
        );
        let frames = page.frames();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].index, 1);
        assert!(frames[1].page.document().select("#inner").exists());
    }

    #[test]
    fn cross_origin_frames_are_skipped() {
        let mut page = Page::with_url(
            r#"<iframe src="https://other.example/embed"></iframe>"#,
            "https://chat.example/c/1",
        );
        page.attach_frame("https://other.example/embed", Page::parse("<pre>x</pre>"))
            .unwrap();

        assert_eq!(page.frames().len(), 1);
    }

    #[test]
    fn attached_same_origin_frames_are_followed() {
        let mut page = Page::with_url(
            r#"<iframe src="/preview#top"></iframe>"#,
            "https://chat.example/c/1",
        );
        page.attach_frame("/preview", Page::parse("<pre id='p'>x</pre>"))
            .unwrap();

        let frames = page.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].src.as_deref(), Some("/preview#top"));
    }

    #[test]
    fn unattached_frames_are_skipped() {
        let page = Page::with_url(r#"<iframe src="/lazy"></iframe>"#, "https://chat.example/");
        assert_eq!(page.frames().len(), 1);
    }

    #[test]
    fn relative_attach_without_url_fails() {
        let mut page = Page::parse("<body></body>");
        let err = page.attach_frame("/relative", Page::parse("")).unwrap_err();
        assert!(matches!(err, Error::FrameError { .. }));
    }

    #[test]
    fn nesting_depth_is_bounded() {
        let mut html = String::from("<pre>leaf</pre>");
        for _ in 0..6 {
            html = format!(r#"<iframe srcdoc="{}"></iframe>"#, html.replace('&', "&amp;").replace('"', "&quot;"));
        }
        let page = Page::parse(&html);

        assert_eq!(page.frames().len(), MAX_FRAME_DEPTH + 1);
    }
}
