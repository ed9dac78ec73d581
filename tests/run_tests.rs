//! End-to-end runs against temporary import and export directories.

#![cfg(feature = "core")]

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use kassenexport::config::Config;
use kassenexport::core::{DiagnosticKind, LedgerError};
use kassenexport::operator::ScriptedOperator;
use kassenexport::run::{Run, RunOutcome, RunReport};
use serde_json::json;

const INVOICE_HEADER: &str = "Status;Bezahlt am;Rechnungs-Nr.;Rechnungsdatum;Rechnungsbetrag;Steuer in %;KOST 1;KOST 2;KOST-Menge;Skonto-Betrag";

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(9, 5, 7)
        .unwrap()
}

struct Workspace {
    _tmp: tempfile::TempDir,
    import: PathBuf,
    export: PathBuf,
    config: Config,
}

impl Workspace {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let import = tmp.path().join("import");
        let export = tmp.path().join("export");
        std::fs::create_dir_all(&import).unwrap();
        let doc = json!({
            "log_file": tmp.path().join("kasse.log"),
            "export_dir": export,
            "sources": {
                "bar_re": {
                    "kind": "cash_invoice",
                    "import_dir": import,
                    "import_format": "csv",
                    "file_matching_string": "Rechnungen",
                    "export_filename": "datev_bar_re",
                    "archive_filename": "verarbeitet"
                },
                "pm": {
                    "kind": "card_terminal",
                    "import_dir": import,
                    "import_format": "html",
                    "file_matching_string": "pm",
                    "export_filename": "datev_pm",
                    "places": ["us", "markt"],
                    "clearing": {
                        "export_filename": "datev_sk_pm",
                        "account": "1095",
                        "mirror_account": "1001"
                    }
                },
                "vendon": {
                    "kind": "vending",
                    "import_dir": import,
                    "import_format": "xlsx",
                    "file_matching_string": "vendon",
                    "export_filename": "datev_vend",
                    "selection": "latest",
                    "machines": {"GA01": "Grill Nord"},
                    "clearing": {
                        "export_filename": "datev_sk_vend",
                        "mirror_account": "1002"
                    }
                },
                "cws": {
                    "kind": "bakery_pos",
                    "import_dir": import,
                    "import_format": "pdf",
                    "file_matching_string": "Kassenbericht",
                    "export_filename": "datev_cws",
                    "archive_filename": "erledigt",
                    "branches": ["HAUPTGESCH", "NIDDA"]
                }
            }
        });
        let config = Config::from_json_str(&doc.to_string()).unwrap();
        Self {
            _tmp: tmp,
            import,
            export,
            config,
        }
    }

    fn write_import(&self, name: &str, content: &str) -> PathBuf {
        let path = self.import.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn export_names(&self) -> Vec<String> {
        names(&self.export)
    }
}

fn names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn exported(outcome: RunOutcome) -> RunReport {
    match outcome {
        RunOutcome::Exported(report) => report,
        other => panic!("expected an export, got {other:?}"),
    }
}

fn invoices() -> String {
    [
        INVOICE_HEADER,
        ";;RE-1001;15.03.2024;1.614,70;19;;;;",
        ";;RE-1002;;75,00;19;;;;",
        ";;RE-1003;01.04.2024;-75,00;7;;;;",
    ]
    .join("\n")
}

// ---------------------------------------------------------------------------
// Cash invoices
// ---------------------------------------------------------------------------

#[test]
fn invalid_row_reported_and_rest_exported() {
    let ws = Workspace::new();
    ws.write_import("Rechnungen_2024-04.csv", &invoices());

    let mut op = ScriptedOperator::new(["yes"]);
    let report = exported(
        Run::new(&ws.config, "bar_re")
            .unwrap()
            .at(at(2024, 4, 2))
            .execute(&mut op)
            .unwrap(),
    );

    assert_eq!(report.entries_written(), 2);
    assert_eq!(report.diagnostics.len(), 1);
    let diag = &report.diagnostics[0];
    assert_eq!(diag.kind, DiagnosticKind::Invalid);
    assert_eq!(diag.field, "Rechnungsdatum");
    assert_eq!(diag.line, 3);
    assert!(diag.file.ends_with("Rechnungen_2024-04.csv"));

    assert_eq!(
        ws.export_names(),
        [
            "datev_bar_re_Monat-03_2024-04-02_09-05-07.csv",
            "datev_bar_re_Monat-04_2024-04-02_09-05-07.csv",
        ]
    );
    let march =
        std::fs::read_to_string(ws.export.join("datev_bar_re_Monat-03_2024-04-02_09-05-07.csv"))
            .unwrap();
    assert_eq!(
        march,
        "Währung;VorzBetrag;RechNr;BelegDatum;Belegtext;UStSatz;BU;Gegenkonto;Kost1;Kost2;Kostmenge;Skonto;Nachricht\r\n\
         EUR;+1614,70;RE-1001;1503;Kundenrechnung Zahlung Bar oder Karte;19;;;;;;;Automatischer Import Bar bezahlter Rechnungen\r\n"
    );
}

#[test]
fn archived_sources_are_not_read_again() {
    let ws = Workspace::new();
    ws.write_import("Rechnungen_a.csv", &invoices());

    let report = exported(
        Run::new(&ws.config, "bar_re")
            .unwrap()
            .at(at(2024, 4, 2))
            .execute(&mut ScriptedOperator::new(["y"]))
            .unwrap(),
    );
    assert_eq!(report.archived.len(), 1);
    assert!(report.unarchived.is_empty());
    assert_eq!(names(&ws.import), ["verarbeitet_2024-04-02_09-05-07.csv"]);

    let err = Run::new(&ws.config, "bar_re")
        .unwrap()
        .at(at(2024, 4, 3))
        .execute(&mut ScriptedOperator::new(["y"]))
        .unwrap_err();
    assert!(matches!(err, LedgerError::NoMatchingFiles { .. }));
}

#[test]
fn declined_preview_touches_nothing() {
    let ws = Workspace::new();
    let source = ws.write_import("Rechnungen_a.csv", &invoices());

    let mut op = ScriptedOperator::new(["nein"]);
    let outcome = Run::new(&ws.config, "bar_re")
        .unwrap()
        .at(at(2024, 4, 2))
        .execute(&mut op)
        .unwrap();

    assert!(matches!(outcome, RunOutcome::Declined));
    assert!(op.questions()[0].contains("Rechnungen_a.csv"));
    assert!(source.exists());
    assert!(ws.export_names().is_empty());
}

#[test]
fn malformed_source_aborts_before_writing() {
    let ws = Workspace::new();
    ws.write_import("Rechnungen_a.csv", &invoices());
    ws.write_import("Rechnungen_b.csv", "Status;Rechnungsdatum\n;15.03.2024\n");

    let err = Run::new(&ws.config, "bar_re")
        .unwrap()
        .at(at(2024, 4, 2))
        .execute(&mut ScriptedOperator::new(["yes"]))
        .unwrap_err();

    let msg = err.to_string();
    assert!(matches!(err, LedgerError::MalformedSource { .. }));
    assert!(msg.contains("Rechnungen_b.csv"));
    assert!(msg.contains("Rechnungsbetrag"));
    assert!(ws.export_names().is_empty());
    assert_eq!(names(&ws.import).len(), 2);
}

#[test]
fn all_rows_settled_exports_nothing() {
    let ws = Workspace::new();
    ws.write_import(
        "Rechnungen_a.csv",
        &[INVOICE_HEADER, "bezahlt;02.04.2024;RE-9;15.03.2024;10,00;19;;;;"].join("\n"),
    );

    let outcome = Run::new(&ws.config, "bar_re")
        .unwrap()
        .at(at(2024, 4, 2))
        .execute(&mut ScriptedOperator::new(["yes"]))
        .unwrap();
    match outcome {
        RunOutcome::NothingToExport { diagnostics, .. } => {
            assert_eq!(diagnostics[0].kind, DiagnosticKind::Skipped);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(names(&ws.import), ["Rechnungen_a.csv"]);
}

#[test]
fn unknown_source_is_configuration_error() {
    let ws = Workspace::new();
    assert!(matches!(
        Run::new(&ws.config, "lotto"),
        Err(LedgerError::Configuration(_))
    ));
}

// ---------------------------------------------------------------------------
// Card terminal with clearing mirror
// ---------------------------------------------------------------------------

#[cfg(feature = "html")]
const TERMINAL_PAGE: &str = r#"<html><body><table id="trans">
<tr><th></th><th>Nr</th><th>Datum</th><th>Betrag</th><th>Zahlart</th></tr>
<tr><td></td><td>1</td><td>16.01.2024 08:00</td><td>500,00</td><td>Einzahlung</td></tr>
<tr><td></td><td>2</td><td>17.01.2024 12:30</td><td>120,00</td><td>Wechselgeld</td></tr>
<tr><td></td><td>3</td><td>18.01.2024 18:00</td><td>900,00</td><td>Auszahlung in die Geldkassette</td></tr>
<tr><td></td><td>4</td><td>20.01.2024 09:00</td><td>40,00</td><td>Einzahlung</td></tr>
</table></body></html>"#;

#[cfg(feature = "html")]
#[test]
fn terminal_resumes_from_cursor_and_mirrors() {
    let ws = Workspace::new();
    std::fs::create_dir_all(&ws.export).unwrap();
    std::fs::write(ws.export.join("datev_pm_us_2024-01-01_2024-01-15.csv"), "").unwrap();
    ws.write_import("pm_us.html", TERMINAL_PAGE);

    let mut op = ScriptedOperator::new(["yes"]);
    let report = exported(
        Run::new(&ws.config, "pm")
            .unwrap()
            .place("us")
            .at(at(2024, 1, 20))
            .execute(&mut op)
            .unwrap(),
    );

    let window = report.window.unwrap();
    assert_eq!(window.start, NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    assert_eq!(window.end, NaiveDate::from_ymd_opt(2024, 1, 19).unwrap());
    assert_eq!(op.questions().len(), 1, "cursor found, no start date prompt");

    // Cash box payout skipped, 20.01. outside the window.
    assert_eq!(report.diagnostics.len(), 2);
    assert!(report.diagnostics.iter().all(|d| d.kind == DiagnosticKind::Skipped));

    assert_eq!(
        ws.export_names(),
        [
            "datev_pm_us_2024-01-01_2024-01-15.csv",
            "datev_pm_us_2024-01-16_2024-01-19.csv",
            "datev_sk_pm_us_2024-01-16_2024-01-19.csv",
        ]
    );
    let main =
        std::fs::read_to_string(ws.export.join("datev_pm_us_2024-01-16_2024-01-19.csv")).unwrap();
    assert!(main.contains("EUR;+500,00;;1601;Einzahlung (us) von/zu Sammelkasse;;;1095;"));
    assert!(main.contains("EUR;-120,00;;1701;Wechselgeld (us) von/zu Sammelkasse;;;1095;"));

    let mirror =
        std::fs::read_to_string(ws.export.join("datev_sk_pm_us_2024-01-16_2024-01-19.csv")).unwrap();
    assert!(mirror.contains("EUR;-500,00;;1601;Einzahlung in/von PM-Kassenautomaten-us;;;1001;"));
    assert!(mirror.contains("EUR;+120,00;;1701;Wechselgeld in/von PM-Kassenautomaten-us;;;1001;"));

    // Without an archive name sources stay in place.
    assert_eq!(names(&ws.import), ["pm_us.html"]);
}

#[cfg(feature = "html")]
#[test]
fn terminal_up_to_date_is_noop() {
    let ws = Workspace::new();
    std::fs::create_dir_all(&ws.export).unwrap();
    std::fs::write(ws.export.join("datev_pm_markt_2024-01-01_2024-01-19.csv"), "").unwrap();
    ws.write_import("pm_markt.html", TERMINAL_PAGE);

    let mut op = ScriptedOperator::default();
    let outcome = Run::new(&ws.config, "pm")
        .unwrap()
        .place("markt")
        .at(at(2024, 1, 20))
        .execute(&mut op)
        .unwrap();
    assert!(matches!(outcome, RunOutcome::NothingToExport { .. }));
    assert!(op.questions().is_empty());
}

#[cfg(feature = "html")]
#[test]
fn terminal_rejects_unknown_place() {
    let ws = Workspace::new();
    let err = Run::new(&ws.config, "pm")
        .unwrap()
        .place("mond")
        .execute(&mut ScriptedOperator::default())
        .unwrap_err();
    assert!(matches!(err, LedgerError::Input(_)));
}

// ---------------------------------------------------------------------------
// Vending machines (latest cumulative export) with clearing mirror
// ---------------------------------------------------------------------------

/// Minimal XLSX with one sheet; numeric-looking values become number cells.
#[cfg(feature = "xlsx")]
fn workbook(rows: &[&[(&str, &str)]]) -> Vec<u8> {
    use std::io::{Cursor, Write};
    use zip::CompressionMethod;
    use zip::write::FileOptions;

    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (i, cells) in rows.iter().enumerate() {
        let r = i + 1;
        sheet.push_str(&format!(r#"<row r="{r}">"#));
        for (col, value) in cells.iter() {
            if value.parse::<f64>().is_ok() {
                sheet.push_str(&format!(r#"<c r="{col}{r}"><v>{value}</v></c>"#));
            } else {
                sheet.push_str(&format!(
                    r#"<c r="{col}{r}" t="inlineStr"><is><t>{value}</t></is></c>"#
                ));
            }
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    let parts = [
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Export" sheetId="1" r:id="rId1"/></sheets></workbook>"#.to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
        ),
        ("xl/worksheets/sheet1.xml", sheet),
    ];

    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, content) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

#[cfg(feature = "xlsx")]
#[test]
fn vending_latest_export_spans_row_dates_and_mirrors() {
    let ws = Workspace::new();
    // Older cumulative export; never opened.
    ws.write_import("vendon_2024-03-01.xlsx", "not a workbook");
    let latest = ws.import.join("vendon_2024-03-03.xlsx");
    std::fs::write(
        &latest,
        workbook(&[
            &[
                ("A", "Nr"),
                ("B", "Datum"),
                ("C", "Maschine"),
                ("E", "Barumsatz"),
                ("P", "Ausbezahlt"),
                ("W", "Aenderung_Wechselgeld"),
            ],
            &[
                ("A", "1"),
                ("B", "01.03.2024"),
                ("C", "*GA01*"),
                ("E", "312.5"),
                ("P", "-20"),
                ("W", "0"),
            ],
            &[
                ("A", "2"),
                ("B", "02.03.2024"),
                ("C", "*GA02*"),
                ("E", "100"),
                ("P", "0"),
                ("W", "50"),
            ],
        ]),
    )
    .unwrap();

    let mut op = ScriptedOperator::new(["yes"]);
    let report = exported(
        Run::new(&ws.config, "vendon")
            .unwrap()
            .at(at(2024, 3, 4))
            .execute(&mut op)
            .unwrap(),
    );

    assert_eq!(report.files_read, [latest]);
    assert!(report.window.is_none());
    assert!(report.diagnostics.is_empty());
    assert_eq!(
        ws.export_names(),
        [
            "datev_sk_vend_2024-03-01_2024-03-02.csv",
            "datev_vend_2024-03-01_2024-03-02.csv",
        ]
    );

    let main =
        std::fs::read_to_string(ws.export.join("datev_vend_2024-03-01_2024-03-02.csv")).unwrap();
    let lines: Vec<&str> = main.lines().skip(1).collect();
    assert_eq!(
        lines,
        [
            "EUR;+312,50;;0103;Automat Grill Nord Barumsatz;;;;;;;;Automatischer Import aus vendon cloud",
            "EUR;-20,00;;0103;Automat Grill Nord Auszahlung;;;1095;;;;;Automatischer Import aus vendon cloud",
            "EUR;+100,00;;0203;Automat GA02 Barumsatz;;;;;;;;Automatischer Import aus vendon cloud",
            "EUR;+50,00;;0203;Automat GA02 Einzahlung;;;1095;;;;;Automatischer Import aus vendon cloud",
        ]
    );

    let mirror =
        std::fs::read_to_string(ws.export.join("datev_sk_vend_2024-03-01_2024-03-02.csv")).unwrap();
    let lines: Vec<&str> = mirror.lines().skip(1).collect();
    assert_eq!(
        lines,
        [
            "EUR;+20,00;;0103;Automat Grill Nord Auszahlung;;;1002;;;;;Automatischer Import aus vendon cloud",
            "EUR;-50,00;;0203;Automat GA02 Einzahlung;;;1002;;;;;Automatischer Import aus vendon cloud",
        ]
    );
}

// ---------------------------------------------------------------------------
// Bakery POS cash report
// ---------------------------------------------------------------------------

/// One-page PDF with the given raw content stream.
#[cfg(feature = "pdf")]
fn report_pdf(content: &[u8]) -> Vec<u8> {
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    });
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        "Contents" => Object::Reference(content_id),
        "Resources" => Object::Reference(resources_id),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

#[cfg(feature = "pdf")]
#[test]
fn bakery_report_exported_by_branch_and_archived() {
    let ws = Workspace::new();
    // Column headings, then one block per branch closed by its summary row.
    let content = b"BT /F1 9 Tf \
        1 0 0 1 40 800 Tm (Warengruppe) Tj 1 0 0 1 100 800 Tm (Umsatz) Tj \
        1 0 0 1 160 800 Tm (Storno) Tj 1 0 0 1 220 800 Tm (Rabatt) Tj \
        1 0 0 1 280 800 Tm (Retoure) Tj 1 0 0 1 340 800 Tm (19%) Tj \
        1 0 0 1 400 800 Tm (7%) Tj 1 0 0 1 460 800 Tm (Gutschein) Tj \
        1 0 0 1 40 780 Tm (HAUPTGESCH\xC4FT) Tj \
        1 0 0 1 40 766 Tm (Brot) Tj 1 0 0 1 100 766 Tm (12,00 \x80) Tj \
        1 0 0 1 40 752 Tm (Datum: 01.03.2024) Tj 1 0 0 1 100 752 Tm (1.234,50 \x80) Tj \
        1 0 0 1 340 752 Tm (1.000,00 \x80) Tj 1 0 0 1 400 752 Tm (200,00 \x80) Tj \
        1 0 0 1 460 752 Tm (34,50 \x80) Tj \
        1 0 0 1 40 730 Tm (NIDDA) Tj \
        1 0 0 1 40 716 Tm (Datum: 02.03.2024) Tj 1 0 0 1 100 716 Tm (400,00 \x80) Tj \
        1 0 0 1 340 716 Tm (400,00 \x80) Tj 1 0 0 1 400 716 Tm (0,00 \x80) Tj \
        1 0 0 1 460 716 Tm (0,00 \x80) Tj ET";
    std::fs::write(ws.import.join("Kassenbericht_0103.pdf"), report_pdf(content)).unwrap();

    let report = exported(
        Run::new(&ws.config, "cws")
            .unwrap()
            .at(at(2024, 3, 4))
            .execute(&mut ScriptedOperator::new(["yes"]))
            .unwrap(),
    );

    assert!(report.diagnostics.is_empty());
    assert_eq!(report.entries_written(), 4);
    assert_eq!(ws.export_names(), ["datev_cws_2024-03-01_2024-03-02.csv"]);
    let csv =
        std::fs::read_to_string(ws.export.join("datev_cws_2024-03-01_2024-03-02.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().skip(1).collect();
    assert_eq!(
        lines,
        [
            "EUR;+1000,00;;0103;T.E. HAUPTGESCHÄFT Einnahmen 19%;19;;;;;;;Automatischer Import aus CWS-Kassenbericht",
            "EUR;+200,00;;0103;T.E. HAUPTGESCHÄFT Einnahmen 7%;7;;;;;;;Automatischer Import aus CWS-Kassenbericht",
            "EUR;+34,50;;0103;T.E. HAUPTGESCHÄFT Gutscheine;0;;;;;;;Automatischer Import aus CWS-Kassenbericht",
            "EUR;+400,00;;0203;T.E. NIDDA Einnahmen 19%;19;;;;;;;Automatischer Import aus CWS-Kassenbericht",
        ]
    );

    assert_eq!(names(&ws.import), ["erledigt_2024-03-04_09-05-07.pdf"]);
}
