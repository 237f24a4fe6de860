//! End-to-end conversion of whole topics: raw Flare XHTML in, linted
//! AsciiDoc out, structural rules verified on the final text.

use flare2adoc::{ConversionOptions, Conversion, WarningCode, convert_topic};

fn convert(html: &str) -> Conversion {
    let _ = env_logger::builder().is_test(true).try_init();
    convert_topic(html, &ConversionOptions::default())
        .unwrap_or_else(|e| panic!("conversion failed: {e}"))
}

#[test]
fn heading_and_paragraph() {
    let result = convert("<html><body><h2>Backups</h2><p>Nightly by default.</p></body></html>");
    assert_eq!(result.text, "== Backups\n\nNightly by default.\n");
    assert!(result.warnings.is_empty());
}

#[test]
fn inline_styling_maps_to_asciidoc_markers() {
    let result = convert("<p>This is <b>bold</b> and <i>italic</i>.</p>");
    assert_eq!(result.text, "This is *bold* and _italic_.\n");
}

#[test]
fn keyboard_span_becomes_monospace() {
    let result = convert("<p>Press <span class=\"Keyboard\">Ctrl+C</span> to stop.</p>");
    assert_eq!(result.text, "Press `Ctrl+C` to stop.\n");
}

#[test]
fn orphan_block_in_list_attaches_to_preceding_item() {
    let result = convert(
        "<ol><li>First step</li><li>Second step</li><p>Result appears.</p></ol>",
    );
    assert_eq!(
        result.text,
        ". First step\n. Second step\n+\nResult appears.\n"
    );
    // Two items, one continuation: the orphan joined the second item.
    assert_eq!(result.text.matches("\n+\n").count(), 1);
}

#[test]
fn nested_alpha_list_gets_style_line_and_deeper_markers() {
    let result = convert(
        "<ol><li>Top<ol style=\"list-style-type: lower-alpha;\"><li>inner</li></ol></li></ol>",
    );
    assert_eq!(result.text, ". Top\n+\n[loweralpha]\n.. inner\n");
}

#[test]
fn strong_text_inside_a_bullet_item_keeps_the_item_marker() {
    let result = convert("<ul><li>item <b>text</b> end</li></ul>");
    assert_eq!(result.text, "* item *text* end\n");
}

#[test]
fn literal_asterisk_inside_a_bullet_item_is_not_emphasis() {
    let result = convert("<ul><li>roughly 3 * 4 meters</li></ul>");
    assert_eq!(result.text, "* roughly 3 * 4 meters\n");
}

#[test]
fn adjacent_sibling_list_is_reparented_with_warning() {
    let result = convert("<ol><li>Step one</li></ol><ul><li>Aside</li></ul>");
    assert_eq!(result.text, ". Step one\n+\n** Aside\n");
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::AmbiguousListNesting),
        "expected an ambiguous-nesting warning, got {:?}",
        result.warnings
    );
}

#[test]
fn dropdown_becomes_collapsible_without_title_duplication() {
    let result = convert(
        "<MadCap:dropDown>\
         <MadCap:dropDownHead><MadCap:dropDownHotspot>Connection details</MadCap:dropDownHotspot></MadCap:dropDownHead>\
         <MadCap:dropDownBody><p>Use port 5432.</p></MadCap:dropDownBody>\
         </MadCap:dropDown>",
    );
    assert_eq!(
        result.text,
        ".Connection details\n[%collapsible]\n====\nUse port 5432.\n====\n"
    );
    assert_eq!(result.text.matches("Connection details").count(), 1);
}

#[test]
fn untitled_single_paragraph_note_uses_short_form() {
    let result = convert("<p class=\"note\">Copies are kept for 30 days.</p>");
    assert_eq!(result.text, "NOTE: Copies are kept for 30 days.\n");
}

#[test]
fn titled_warning_consumes_lead_span_exactly_once() {
    let result = convert(
        "<div class=\"warning\"><p><span class=\"warningInDiv\">Warning!</span> \
         Do not unplug the device.</p></div>",
    );
    assert_eq!(
        result.text,
        ".Warning!\n[WARNING]\n====\nDo not unplug the device.\n====\n"
    );
    assert_eq!(result.text.matches("Warning!").count(), 1);
}

#[test]
fn image_with_surrounding_text_stays_inline() {
    let result = convert("<p>Click <img src=\"icon.png\" alt=\"icon\"/> to continue.</p>");
    assert_eq!(result.text, "Click image:icon.png[icon] to continue.\n");
}

#[test]
fn lone_image_paragraph_becomes_block_macro() {
    let result = convert("<p><img src=\"diagram.png\" alt=\"Overview\"/></p>");
    assert_eq!(result.text, "image::diagram.png[Overview]\n");
}

#[test]
fn images_dropped_when_not_preserved() {
    let options = ConversionOptions {
        preserve_images: false,
        ..ConversionOptions::default()
    };
    let result = convert_topic("<p><img src=\"diagram.png\" alt=\"x\"/></p>", &options)
        .unwrap_or_else(|e| panic!("conversion failed: {e}"));
    assert_eq!(result.text, "");
}

#[test]
fn table_with_header_row() {
    let result = convert(
        "<table><tr><th>Name</th><th>Port</th></tr><tr><td>db</td><td>5432</td></tr></table>",
    );
    assert_eq!(
        result.text,
        "[options=\"header\"]\n|===\n|Name |Port\n|db |5432\n|===\n"
    );
}

#[test]
fn code_block_keeps_language_and_literal_text() {
    let result =
        convert("<pre><code class=\"language-bash\">echo hello</code></pre>");
    assert_eq!(result.text, "[source,bash]\n----\necho hello\n----\n");
}

#[test]
fn blockquote_and_rule() {
    let result = convert("<blockquote><p>Measure twice.</p></blockquote><hr/>");
    assert_eq!(result.text, "____\nMeasure twice.\n____\n\n'''\n");
}

#[test]
fn paragraph_lines_that_look_like_block_syntax_are_defused() {
    let result = convert("<p>. Leading dot here</p>");
    assert_eq!(result.text, "{empty}. Leading dot here\n");

    let result = convert("<p>+</p>");
    assert_eq!(result.text, "{plus}\n");

    let result = convert("<p>----</p>");
    assert_eq!(result.text, "{empty}----\n");
}

#[test]
fn unknown_element_degrades_to_content_with_warning() {
    let result = convert("<p>Before <blink>shiny</blink> after.</p>");
    assert_eq!(result.text, "Before shiny after.\n");
    assert!(
        result
            .warnings
            .iter()
            .any(|w| w.code == WarningCode::UnknownElement)
    );
}

#[test]
fn empty_input_is_a_fatal_parse_error() {
    assert!(convert_topic("", &ConversionOptions::default()).is_err());
    assert!(convert_topic("   \n\t", &ConversionOptions::default()).is_err());
}

#[test]
fn post_lint_can_be_disabled() {
    let html = "<h1>T</h1><p>Body.</p>";
    let linted = convert(html);
    let raw = convert_topic(
        html,
        &ConversionOptions {
            post_lint: false,
            ..ConversionOptions::default()
        },
    )
    .unwrap_or_else(|e| panic!("conversion failed: {e}"));
    // With this well-formed input the lint is a no-op apart from the final
    // newline, which the unlinted text does not carry.
    assert_eq!(linted.text, format!("{}\n", raw.text));
}

#[test]
fn conversion_serializes_for_batch_drivers() {
    let result = convert("<p>See <MadCap:xref href=\"gone.htm\">Gone</MadCap:xref>.</p>");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["text"], "See xref:gone.adoc[Gone].\n");
    assert_eq!(json["metadata"]["unresolved_xref_count"], 0);
    assert!(json["warnings"].as_array().unwrap().is_empty());
}
