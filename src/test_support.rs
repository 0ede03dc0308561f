//! In-memory `.pptx` fixtures for tests and benchmarks.
//!
//! Decks are assembled with `zip::ZipWriter` from small XML snippets: one
//! theme, one master, one layout and any number of slides.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const NS_DECL: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Zip the given (name, content) pairs as stored entries.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let binary: Vec<(String, Vec<u8>)> = entries
        .iter()
        .map(|(n, c)| (n.to_string(), c.as_bytes().to_vec()))
        .collect();
    zip_binary(&binary)
}

fn zip_binary(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        zip.start_file(name.as_str(), options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// `<a:xfrm>` for the given EMU rectangle.
pub fn xfrm(x: i64, y: i64, cx: i64, cy: i64) -> String {
    format!(
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        x, y, cx, cy
    )
}

/// A text shape; `ph` is the inner attributes of `<p:ph>` when a placeholder.
pub fn text_shape(id: u32, ph: Option<&str>, sp_pr: &str, text: &str) -> String {
    let nv_pr = match ph {
        Some(attrs) => format!("<p:nvPr><p:ph {}/></p:nvPr>", attrs),
        None => "<p:nvPr/>".to_string(),
    };
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Shape {id}"/><p:cNvSpPr/>{nv_pr}</p:nvSpPr><p:spPr>{sp_pr}</p:spPr><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
    )
}

/// A shape without text.
pub fn plain_shape(id: u32, sp_pr: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Shape {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>{sp_pr}</p:spPr></p:sp>"#
    )
}

/// A picture referencing relationship `rel_id`.
pub fn picture(id: u32, rel_id: &str, sp_pr: &str) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>{sp_pr}</p:spPr></p:pic>"#
    )
}

struct SlideSpec {
    sp_tree: String,
    rels: Vec<(String, String, String, bool)>,
    background: String,
    attrs: String,
}

/// Builder for synthetic decks.
pub struct DeckBuilder {
    slides: Vec<SlideSpec>,
    layout_shapes: String,
    layout_background: String,
    master_shapes: String,
    master_background: String,
    master_tx_styles: String,
    theme_colors: String,
    slide_size: (i64, i64),
    extra: Vec<(String, Vec<u8>)>,
    extra_overrides: Vec<(String, String)>,
    omitted: Vec<String>,
    skip_presentation: bool,
}

impl Default for DeckBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self {
            slides: Vec::new(),
            layout_shapes: format!(
                "{}{}",
                text_shape(2, Some(r#"type="title""#), &xfrm(457200, 274638, 8229600, 1143000), ""),
                text_shape(3, Some(r#"idx="1""#), &xfrm(457200, 1600200, 8229600, 4525963), ""),
            ),
            layout_background: String::new(),
            master_shapes: format!(
                "{}{}",
                text_shape(2, Some(r#"type="title""#), &xfrm(457200, 274638, 8229600, 1143000), ""),
                text_shape(3, Some(r#"type="body" idx="1""#), &xfrm(457200, 1600200, 8229600, 4525963), ""),
            ),
            master_background: r#"<p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#
                .to_string(),
            master_tx_styles: r#"<p:txStyles><p:titleStyle><a:lvl1pPr algn="ctr"><a:defRPr sz="4400"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle><p:bodyStyle><a:lvl1pPr><a:buChar char="&#8226;"/><a:defRPr sz="3200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr><a:lvl2pPr><a:defRPr sz="2800"/></a:lvl2pPr></p:bodyStyle><p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"/></a:lvl1pPr></p:otherStyle></p:txStyles>"#
                .to_string(),
            theme_colors: r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2><a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2><a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4><a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6><a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink>"#
                .to_string(),
            slide_size: (9144000, 6858000),
            extra: Vec::new(),
            extra_overrides: Vec::new(),
            omitted: Vec::new(),
            skip_presentation: false,
        }
    }

    /// Add a slide whose `p:spTree` holds the given shapes.
    pub fn slide(self, shapes: &str) -> Self {
        self.slide_with(shapes, &[], "", "")
    }

    /// Add a slide with one plain text box.
    pub fn slide_text(self, text: &str) -> Self {
        let shape = text_shape(2, None, &xfrm(914400, 914400, 1828800, 914400), text);
        self.slide(&shape)
    }

    /// Add a slide with extra relationships `(id, type suffix, target)`,
    /// a `p:bg` element and extra `p:sld` attributes.
    pub fn slide_with(
        mut self,
        shapes: &str,
        rels: &[(&str, &str, &str)],
        background: &str,
        attrs: &str,
    ) -> Self {
        self.slides.push(SlideSpec {
            sp_tree: shapes.to_string(),
            rels: rels
                .iter()
                .map(|(id, ty, target)| {
                    let external = target.starts_with("http");
                    (id.to_string(), ty.to_string(), target.to_string(), external)
                })
                .collect(),
            background: background.to_string(),
            attrs: attrs.to_string(),
        });
        self
    }

    pub fn layout_shapes(mut self, shapes: &str) -> Self {
        self.layout_shapes = shapes.to_string();
        self
    }

    pub fn layout_background(mut self, bg: &str) -> Self {
        self.layout_background = bg.to_string();
        self
    }

    pub fn master_shapes(mut self, shapes: &str) -> Self {
        self.master_shapes = shapes.to_string();
        self
    }

    pub fn master_background(mut self, bg: &str) -> Self {
        self.master_background = bg.to_string();
        self
    }

    /// Replace the children of `a:clrScheme`.
    pub fn theme_colors(mut self, colors: &str) -> Self {
        self.theme_colors = colors.to_string();
        self
    }

    pub fn slide_size(mut self, cx: i64, cy: i64) -> Self {
        self.slide_size = (cx, cy);
        self
    }

    /// Add an arbitrary part with no content-type override.
    ///
    /// A part with the name of a generated part replaces it.
    pub fn raw_part(mut self, name: &str, content: &str) -> Self {
        self.extra.push((name.to_string(), content.as_bytes().to_vec()));
        self
    }

    /// Add a binary part.
    pub fn binary_part(mut self, name: &str, content: &[u8]) -> Self {
        self.extra.push((name.to_string(), content.to_vec()));
        self
    }

    /// Declare a content-type override.
    pub fn content_override(mut self, part: &str, content_type: &str) -> Self {
        self.extra_overrides
            .push((part.to_string(), content_type.to_string()));
        self
    }

    /// Leave a generated part out of the archive.
    pub fn without_part(mut self, name: &str) -> Self {
        self.omitted.push(name.to_string());
        self
    }

    /// Leave out `ppt/presentation.xml` and its relationships.
    pub fn without_presentation(mut self) -> Self {
        self.skip_presentation = true;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
        let mut push = |name: &str, content: String| {
            entries.push((name.to_string(), content.into_bytes()));
        };

        let mut overrides = String::new();
        for i in 1..=self.slides.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                i
            ));
        }
        for (part, ct) in &self.extra_overrides {
            overrides.push_str(&format!(
                r#"<Override PartName="/{}" ContentType="{}"/>"#,
                part.trim_start_matches('/'),
                ct
            ));
        }
        push(
            "[Content_Types].xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Default Extension="jpeg" ContentType="image/jpeg"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>{}</Types>"#,
                overrides
            ),
        );

        if !self.skip_presentation {
            push(
                "_rels/.rels",
                rels_xml(&[(
                    "rId1".into(),
                    "officeDocument".into(),
                    "ppt/presentation.xml".into(),
                    false,
                )]),
            );

            let mut pres_rels = vec![(
                "rId1".to_string(),
                "slideMaster".to_string(),
                "slideMasters/slideMaster1.xml".to_string(),
                false,
            )];
            let mut sld_ids = String::new();
            for i in 1..=self.slides.len() {
                pres_rels.push((
                    format!("rId{}", i + 1),
                    "slide".into(),
                    format!("slides/slide{}.xml", i),
                    false,
                ));
                sld_ids.push_str(&format!(
                    r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                    255 + i,
                    i + 1
                ));
            }
            pres_rels.push((
                format!("rId{}", self.slides.len() + 2),
                "theme".into(),
                "theme/theme1.xml".into(),
                false,
            ));
            push("ppt/_rels/presentation.xml.rels", rels_xml(&pres_rels));
            push(
                "ppt/presentation.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {NS_DECL}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{sld_ids}</p:sldIdLst><p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
                    self.slide_size.0, self.slide_size.1
                ),
            );
        }

        push(
            "ppt/theme/theme1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office">{}</a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:tint val="50000"/></a:schemeClr></a:solidFill><a:gradFill><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"/></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:shade val="50000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="5400000"/></a:gradFill></a:fillStyleLst><a:lnStyleLst><a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="25400"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln><a:ln w="38100"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst><a:effectStyleLst/><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:tint val="95000"/></a:schemeClr></a:solidFill><a:solidFill><a:srgbClr val="000000"/></a:solidFill></a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#,
                self.theme_colors
            ),
        );

        let mut master_rels = vec![(
            "rId1".to_string(),
            "slideLayout".to_string(),
            "../slideLayouts/slideLayout1.xml".to_string(),
            false,
        )];
        master_rels.push((
            "rId2".into(),
            "theme".into(),
            "../theme/theme1.xml".into(),
            false,
        ));
        push(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            rels_xml(&master_rels),
        );
        push(
            "ppt/slideMasters/slideMaster1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster {NS_DECL}><p:cSld>{}<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>{}</p:sldMaster>"#,
                self.master_background, self.master_shapes, self.master_tx_styles
            ),
        );

        push(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            rels_xml(&[(
                "rId1".into(),
                "slideMaster".into(),
                "../slideMasters/slideMaster1.xml".into(),
                false,
            )]),
        );
        push(
            "ppt/slideLayouts/slideLayout1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout {NS_DECL} type="titleAndObj"><p:cSld name="Title and Content">{}<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sldLayout>"#,
                self.layout_background, self.layout_shapes
            ),
        );

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            let mut rels = vec![(
                "rId1".to_string(),
                "slideLayout".to_string(),
                "../slideLayouts/slideLayout1.xml".to_string(),
                false,
            )];
            rels.extend(slide.rels.iter().cloned());
            push(&format!("ppt/slides/_rels/slide{}.xml.rels", n), rels_xml(&rels));
            push(
                &format!("ppt/slides/slide{}.xml", n),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NS_DECL} {}><p:cSld>{}<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
                    slide.attrs, slide.background, slide.sp_tree
                ),
            );
        }

        for (name, data) in self.extra {
            match entries.iter_mut().find(|(n, _)| *n == name) {
                Some(entry) => entry.1 = data,
                None => entries.push((name, data)),
            }
        }
        entries.retain(|(name, _)| !self.omitted.contains(name));
        zip_binary(&entries)
    }
}

fn rels_xml(rels: &[(String, String, String, bool)]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, ty, target, external) in rels {
        let mode = if *external {
            r#" TargetMode="External""#
        } else {
            ""
        };
        out.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}/{}" Target="{}"{}/>"#,
            id, REL_BASE, ty, target, mode
        ));
    }
    out.push_str("</Relationships>");
    out
}
