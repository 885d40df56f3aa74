//! XLSX Workbook Writer Module
//! Writes worksheets, chartsheets and line charts with custom error bars.
//!
//! Uses direct ZIP/XML generation: every part of the SpreadsheetML package is
//! produced as a string and stored in the archive.

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use zip::write::FileOptions;
use zip::ZipWriter;

/// Excel's sheet name length limit.
pub const MAX_SHEET_NAME: usize = 31;

#[derive(Error, Debug)]
pub enum XlsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Duplicate sheet name {0:?}")]
    DuplicateSheet(String),
    #[error("Workbook has no sheets")]
    Empty,
}

/// A single worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            CellValue::Number(v)
        } else {
            CellValue::Empty
        }
    }
}

impl From<Option<f64>> for CellValue {
    fn from(v: Option<f64>) -> Self {
        v.map(CellValue::from).unwrap_or(CellValue::Empty)
    }
}

impl From<u32> for CellValue {
    fn from(v: u32) -> Self {
        CellValue::Number(v as f64)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::Text(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::Text(v)
    }
}

/// Column letters for a zero-based column index (0 → "A", 26 → "AA").
pub fn col_name(col: usize) -> String {
    let mut n = col + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// A1-style reference for a zero-based row and column.
pub fn cell_name(row: usize, col: usize) -> String {
    format!("{}{}", col_name(col), row + 1)
}

/// Absolute reference ("$C$3").
pub fn abs_cell_name(row: usize, col: usize) -> String {
    format!("${}${}", col_name(col), row + 1)
}

/// Make a string usable as a sheet name: strip forbidden characters and cap the length.
pub fn sheet_name(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect()
}

/// A rectangular cell range on a named sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet: String,
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl SheetRange {
    pub fn cell(sheet: &str, row: usize, col: usize) -> Self {
        Self::new(sheet, row, col, row, col)
    }

    pub fn new(sheet: &str, first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self {
            sheet: sheet.to_string(),
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    /// Formula text, e.g. `'Length_Data'!$C$1:$E$1`.
    pub fn formula(&self) -> String {
        let sheet = format!("'{}'", self.sheet.replace('\'', "''"));
        let start = abs_cell_name(self.first_row, self.first_col);
        if self.first_row == self.last_row && self.first_col == self.last_col {
            format!("{}!{}", sheet, start)
        } else {
            format!(
                "{}!{}:{}",
                sheet,
                start,
                abs_cell_name(self.last_row, self.last_col)
            )
        }
    }
}

/// A grid of cells; the first row can be rendered as a bold header.
#[derive(Debug, Clone)]
pub struct Worksheet {
    pub name: String,
    pub bold_header: bool,
    rows: Vec<Vec<CellValue>>,
}

impl Worksheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: sheet_name(name),
            bold_header: false,
            rows: Vec::new(),
        }
    }

    /// Add a bold header row.
    pub fn with_header<S: AsRef<str>>(name: &str, header: &[S]) -> Self {
        let mut ws = Self::new(name);
        ws.bold_header = true;
        ws.push_row(header.iter().map(|h| CellValue::from(h.as_ref())).collect());
        ws
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }
}

/// One line of a line chart.
#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub name: SheetRange,
    pub categories: SheetRange,
    pub values: SheetRange,
    /// Symmetric custom Y error bars.
    pub error_bars: Option<SheetRange>,
}

/// A line chart with circle markers.
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub y_axis_title: String,
    pub y_min: Option<f64>,
    pub series: Vec<ChartSeries>,
}

/// A sheet holding only a chart.
#[derive(Debug, Clone)]
pub struct Chartsheet {
    pub name: String,
    pub chart: LineChart,
}

impl Chartsheet {
    pub fn new(name: &str, chart: LineChart) -> Self {
        Self {
            name: sheet_name(name),
            chart,
        }
    }
}

#[derive(Debug, Clone)]
enum Sheet {
    Work(Worksheet),
    Chart(Chartsheet),
}

impl Sheet {
    fn name(&self) -> &str {
        match self {
            Sheet::Work(ws) => &ws.name,
            Sheet::Chart(cs) => &cs.name,
        }
    }
}

/// Workbook builder; sheets keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
    names: HashSet<String>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim(&mut self, name: &str) -> Result<(), XlsxError> {
        // Excel compares sheet names case-insensitively
        if !self.names.insert(name.to_lowercase()) {
            return Err(XlsxError::DuplicateSheet(name.to_string()));
        }
        Ok(())
    }

    pub fn add_worksheet(&mut self, ws: Worksheet) -> Result<(), XlsxError> {
        self.claim(&ws.name)?;
        self.sheets.push(Sheet::Work(ws));
        Ok(())
    }

    pub fn add_chartsheet(&mut self, cs: Chartsheet) -> Result<(), XlsxError> {
        self.claim(&cs.name)?;
        self.sheets.push(Sheet::Chart(cs));
        Ok(())
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(Sheet::name).collect()
    }

    /// Write the package to disk.
    pub fn save(&self, output_path: &Path) -> Result<(), XlsxError> {
        if self.sheets.is_empty() {
            return Err(XlsxError::Empty);
        }

        let file = File::create(output_path)?;
        let mut zip = ZipWriter::new(file);
        let options = FileOptions::default();

        let n_work = self.sheets.iter().filter(|s| matches!(s, Sheet::Work(_))).count();
        let n_chart = self.sheets.len() - n_work;

        // 1. [Content_Types].xml
        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(Self::content_types_xml(n_work, n_chart).as_bytes())?;

        // 2. _rels/.rels
        zip.start_file("_rels/.rels", options)?;
        zip.write_all(Self::rels_xml().as_bytes())?;

        // 3. docProps
        zip.start_file("docProps/core.xml", options)?;
        zip.write_all(Self::core_props_xml().as_bytes())?;
        zip.start_file("docProps/app.xml", options)?;
        zip.write_all(Self::app_props_xml().as_bytes())?;

        // 4. xl/workbook.xml and its relationships
        let targets = self.sheet_targets();
        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(self.workbook_xml().as_bytes())?;
        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(Self::workbook_rels_xml(&targets).as_bytes())?;

        // 5. Styles
        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(Self::styles_xml().as_bytes())?;

        // 6. Sheets, with drawing and chart parts for chartsheets
        let mut work_idx = 0;
        let mut chart_idx = 0;
        for sheet in &self.sheets {
            match sheet {
                Sheet::Work(ws) => {
                    work_idx += 1;
                    zip.start_file(format!("xl/worksheets/sheet{}.xml", work_idx), options)?;
                    zip.write_all(Self::worksheet_xml(ws).as_bytes())?;
                }
                Sheet::Chart(cs) => {
                    chart_idx += 1;
                    zip.start_file(format!("xl/chartsheets/sheet{}.xml", chart_idx), options)?;
                    zip.write_all(Self::chartsheet_xml().as_bytes())?;
                    zip.start_file(
                        format!("xl/chartsheets/_rels/sheet{}.xml.rels", chart_idx),
                        options,
                    )?;
                    zip.write_all(Self::single_rel_xml("drawing", &format!("../drawings/drawing{}.xml", chart_idx)).as_bytes())?;

                    zip.start_file(format!("xl/drawings/drawing{}.xml", chart_idx), options)?;
                    zip.write_all(Self::drawing_xml().as_bytes())?;
                    zip.start_file(
                        format!("xl/drawings/_rels/drawing{}.xml.rels", chart_idx),
                        options,
                    )?;
                    zip.write_all(Self::single_rel_xml("chart", &format!("../charts/chart{}.xml", chart_idx)).as_bytes())?;

                    zip.start_file(format!("xl/charts/chart{}.xml", chart_idx), options)?;
                    zip.write_all(Self::chart_xml(&cs.chart).as_bytes())?;
                }
            }
        }

        zip.finish()?;
        Ok(())
    }

    /// (relationship type, target) of every sheet in order.
    fn sheet_targets(&self) -> Vec<(&'static str, String)> {
        let mut work_idx = 0;
        let mut chart_idx = 0;
        self.sheets
            .iter()
            .map(|sheet| match sheet {
                Sheet::Work(_) => {
                    work_idx += 1;
                    ("worksheet", format!("worksheets/sheet{}.xml", work_idx))
                }
                Sheet::Chart(_) => {
                    chart_idx += 1;
                    ("chartsheet", format!("chartsheets/sheet{}.xml", chart_idx))
                }
            })
            .collect()
    }

    fn content_types_xml(n_work: usize, n_chart: usize) -> String {
        let mut xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
"#
        .to_string();

        for i in 1..=n_work {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                i
            ));
            xml.push('\n');
        }
        for i in 1..=n_chart {
            xml.push_str(&format!(
                r#"<Override PartName="/xl/chartsheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.chartsheet+xml"/>
<Override PartName="/xl/drawings/drawing{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawing+xml"/>
<Override PartName="/xl/charts/chart{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawingml.chart+xml"/>"#
            ));
            xml.push('\n');
        }
        xml.push_str("</Types>");
        xml
    }

    fn rels_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#
    }

    fn workbook_xml(&self) -> String {
        let mut sheets = String::new();
        for (i, sheet) in self.sheets.iter().enumerate() {
            sheets.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                escape_xml(sheet.name()),
                i + 1,
                i + 1
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<bookViews><workbookView/></bookViews>
<sheets>{}</sheets>
</workbook>"#,
            sheets
        )
    }

    fn workbook_rels_xml(targets: &[(&str, String)]) -> String {
        let mut xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#
        .to_string();

        for (i, (kind, target)) in targets.iter().enumerate() {
            xml.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}" Target="{}"/>"#,
                i + 1,
                kind,
                target
            ));
            xml.push('\n');
        }
        xml.push_str(&format!(
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            targets.len() + 1
        ));
        xml.push_str("\n</Relationships>");
        xml
    }

    fn single_rel_xml(kind: &str, target: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}" Target="{}"/>
</Relationships>"#,
            kind, target
        )
    }

    fn styles_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="2"><font><sz val="11"/><name val="Calibri"/><family val="2"/></font><font><b/><sz val="11"/><name val="Calibri"/><family val="2"/></font></fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs>
<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#
    }

    fn worksheet_xml(ws: &Worksheet) -> String {
        let mut data = String::new();
        for (r, row) in ws.rows().iter().enumerate() {
            let style = if ws.bold_header && r == 0 {
                r#" s="1""#
            } else {
                ""
            };
            data.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, cell) in row.iter().enumerate() {
                let reference = cell_name(r, c);
                match cell {
                    CellValue::Number(v) if v.is_finite() => {
                        data.push_str(&format!(r#"<c r="{}"{}><v>{}</v></c>"#, reference, style, v));
                    }
                    CellValue::Text(s) => {
                        let space = if s.trim() != s {
                            r#" xml:space="preserve""#
                        } else {
                            ""
                        };
                        data.push_str(&format!(
                            r#"<c r="{}"{} t="inlineStr"><is><t{}>{}</t></is></c>"#,
                            reference,
                            style,
                            space,
                            escape_xml(s)
                        ));
                    }
                    _ => {}
                }
            }
            data.push_str("</row>");
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheetData>{}</sheetData>
</worksheet>"#,
            data
        )
    }

    fn chartsheet_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<chartsheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheetPr/>
<sheetViews><sheetView zoomScale="100" zoomToFit="1" workbookViewId="0"/></sheetViews>
<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>
<drawing r:id="rId1"/>
</chartsheet>"#
    }

    fn drawing_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
<xdr:absoluteAnchor>
<xdr:pos x="0" y="0"/>
<xdr:ext cx="9308969" cy="6078141"/>
<xdr:graphicFrame macro="">
<xdr:nvGraphicFramePr><xdr:cNvPr id="2" name="Chart 1"/><xdr:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></xdr:cNvGraphicFramePr></xdr:nvGraphicFramePr>
<xdr:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/></xdr:xfrm>
<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" r:id="rId1"/></a:graphicData></a:graphic>
</xdr:graphicFrame>
<xdr:clientData/>
</xdr:absoluteAnchor>
</xdr:wsDr>"#
    }

    fn rich_title(text: &str, rotated: bool) -> String {
        let body = if rotated {
            r#"<a:bodyPr rot="-5400000" vert="horz"/>"#
        } else {
            "<a:bodyPr/>"
        };
        format!(
            r#"<c:title><c:tx><c:rich>{}<a:lstStyle/><a:p><a:r><a:t>{}</a:t></a:r></a:p></c:rich></c:tx><c:overlay val="0"/></c:title>"#,
            body,
            escape_xml(text)
        )
    }

    fn series_xml(idx: usize, s: &ChartSeries) -> String {
        let err_bars = s
            .error_bars
            .as_ref()
            .map(|range| {
                let f = escape_xml(&range.formula());
                format!(
                    r#"<c:errBars><c:errDir val="y"/><c:errBarType val="both"/><c:errValType val="cust"/><c:noEndCap val="0"/><c:plus><c:numRef><c:f>{f}</c:f></c:numRef></c:plus><c:minus><c:numRef><c:f>{f}</c:f></c:numRef></c:minus></c:errBars>"#
                )
            })
            .unwrap_or_default();

        format!(
            r#"<c:ser><c:idx val="{idx}"/><c:order val="{idx}"/><c:tx><c:strRef><c:f>{}</c:f></c:strRef></c:tx><c:spPr><a:ln w="25400"/></c:spPr><c:marker><c:symbol val="circle"/><c:size val="4"/></c:marker>{}<c:cat><c:strRef><c:f>{}</c:f></c:strRef></c:cat><c:val><c:numRef><c:f>{}</c:f></c:numRef></c:val><c:smooth val="0"/></c:ser>"#,
            escape_xml(&s.name.formula()),
            err_bars,
            escape_xml(&s.categories.formula()),
            escape_xml(&s.values.formula()),
        )
    }

    fn chart_xml(chart: &LineChart) -> String {
        let series: String = chart
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| Self::series_xml(i, s))
            .collect();
        let y_min = chart
            .y_min
            .map(|v| format!(r#"<c:min val="{}"/>"#, v))
            .unwrap_or_default();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<c:roundedCorners val="0"/>
<c:chart>
{title}
<c:autoTitleDeleted val="0"/>
<c:plotArea>
<c:layout/>
<c:lineChart><c:grouping val="standard"/><c:varyColors val="0"/>{series}<c:marker val="1"/><c:axId val="50010001"/><c:axId val="50010002"/></c:lineChart>
<c:catAx><c:axId val="50010001"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="b"/><c:numFmt formatCode="General" sourceLinked="1"/><c:tickLblPos val="nextTo"/><c:crossAx val="50010002"/><c:crosses val="autoZero"/><c:auto val="0"/><c:lblAlgn val="ctr"/><c:lblOffset val="100"/><c:noMultiLvlLbl val="0"/></c:catAx>
<c:valAx><c:axId val="50010002"/><c:scaling><c:orientation val="minMax"/>{y_min}</c:scaling><c:delete val="0"/><c:axPos val="l"/><c:majorGridlines/>{y_title}<c:numFmt formatCode="General" sourceLinked="1"/><c:tickLblPos val="nextTo"/><c:crossAx val="50010001"/><c:crosses val="autoZero"/><c:crossBetween val="between"/></c:valAx>
</c:plotArea>
<c:legend><c:legendPos val="b"/><c:overlay val="0"/></c:legend>
<c:plotVisOnly val="1"/>
<c:dispBlanksAs val="gap"/>
</c:chart>
</c:chartSpace>"#,
            title = Self::rich_title(&chart.title, false),
            series = series,
            y_min = y_min,
            y_title = Self::rich_title(&chart.y_axis_title, true),
        )
    }

    fn core_props_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
<dc:creator>data-plotting</dc:creator>
<cp:lastModifiedBy>data-plotting</cp:lastModifiedBy>
</cp:coreProperties>"#
    }

    fn app_props_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
<Application>data-plotting</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
</Properties>"#
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
