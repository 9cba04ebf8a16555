/// Static description of the queryable schema, injected verbatim into the
/// translator prompt. Bump the version line when the shape changes.
const SCHEMA_CONTEXT: &str = r#"結構版本: 3

資料表:
  - members (會員)
    欄位:
      * id (bigint) [PRIMARY KEY]
      * name (text) -- 會員姓名
      * phone (text)
      * level (text) -- 會員等級，有效值: '一般', '銀卡', '金卡'
      * joined_at (timestamptz) -- 入會時間

  - member_transactions (會員交易)
    欄位:
      * id (bigint) [PRIMARY KEY]
      * member_id (bigint) [FOREIGN KEY -> members.id]
      * store (text) -- 門市名稱，有效值: '台北門市', '台中門市', '高雄門市', '網路商店'
      * amount (numeric) -- 金額，台幣
      * transaction_type (text) -- 交易類型，有效值: '消費', '儲值', '退貨'
      * created_at (timestamptz) -- 交易時間
    注意:
      * 計算營收時只能計入 transaction_type = '消費' 的紀錄，
        '儲值' 是預付金額、'退貨' 是退款，兩者都不是營收。
      * 查詢某個月份時請用日期範圍，不要用 EXTRACT(MONTH ...)，
        否則會跨年份混在一起。

  - products (商品)
    欄位:
      * id (bigint) [PRIMARY KEY]
      * name (text) -- 商品名稱
      * category (text) -- 商品分類
      * price (numeric) -- 售價
      * stock (integer) -- 庫存量
"#;

pub fn schema_context() -> &'static str {
    SCHEMA_CONTEXT
}
