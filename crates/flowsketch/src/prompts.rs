//! Instruction payloads sent to the language model.

/// Instructions for the primary extraction call.
pub const EXTRACTION_INSTRUCTIONS: &str = r#"あなたはデータフローダイアグラム/Simulink/ブロック図の読解専門家です。
与えられた「画像のみ」を根拠に、以下の構造を純粋なJSONで返してください。
- 入出力ノード（丸/端点/Source/Sink）
- 処理ブロック（矩形/楕円）とラベル（例: 処理1）
- データストア/メモリ/DB（円筒/二重線/開いた箱）
- 矢印の向きと接続（分岐/並列/合流/循環）

不明な名称は "名称不明" とする。画像に無い内容は推測しない。

JSONスキーマ:
{
  "processes": [{"id":"P1","name":"文字列","description":"文字列"}],
  "data_stores": [{"id":"D1","name":"文字列","description":"文字列"}],
  "external_entities": [{"id":"E1","name":"文字列","description":"文字列"}],
  "data_flows": [{"id":"F1","from":"ID","to":"ID","data":"文字列"}],
  "system_overview": "文字列"
}

出力はこのJSONのみ。前置き/後置き/注釈は禁止。"#;

/// Text part accompanying the image in the primary extraction call.
pub const EXTRACTION_REQUEST: &str =
    "画像から図形要素と接続を抽出し、スキーマ通りのJSONだけを返してください。";

/// Combined prompt for the secondary extraction call.
pub const EXTRACTION_CHAT_PROMPT: &str = r#"あなたはDFD/Simulink図の読解専門家です。画像だけを根拠に、次のJSONスキーマで純粋なJSONのみを返してください。
{
  "processes": [{"id":"P1","name":"文字列","description":"文字列"}],
  "data_stores": [{"id":"D1","name":"文字列","description":"文字列"}],
  "external_entities": [{"id":"E1","name":"文字列","description":"文字列"}],
  "data_flows": [{"id":"F1","from":"ID","to":"ID","data":"文字列"}],
  "system_overview": "文字列"
}
不明な名称は "名称不明"。推測はしない。前置き/後置きは禁止。"#;

/// Instructions for both summary calls.
pub const SUMMARY_INSTRUCTIONS: &str = r#"あなたはシステムブロック図/DFD/Simulink図の要約ライターです。
与えられた入力だけを根拠に、モデルの概要を次の3つの見出しで日本語で記述してください。

① モデル化対象
（何をモデル化したシステムか）
② モデル化の範囲・抽象度
（入力から出力までのどの範囲を、どの程度の粒度で表現しているか）
③ モデル化した機能
（処理・データ保存・統合などの主な機能）

- 各見出しは上記のとおり記載し、見出しの直後で改行してから内容を書く。
- 箇条書きやMarkdownの見出しは使わない。
- 図中のラベルは原文どおりに用いる。不明は「名称不明」と記載する。
- 入力に無い内容は推測しない。"#;

/// Builds the user payload of a summary call.
pub fn summary_input(descriptor: &str, payload: &str) -> String {
    format!("次の{descriptor}を基に、上記の見出し構成に厳密に従って出力してください。\n\n{payload}")
}
