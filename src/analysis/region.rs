use once_cell::sync::Lazy;
use regex::Regex;

/// 台灣 22 個縣市，一律使用「台」字
pub const TAIWAN_REGIONS: [&str; 22] = [
    "台北市", "新北市", "桃園市", "台中市", "台南市", "高雄市", "基隆市", "新竹市", "嘉義市",
    "新竹縣", "苗栗縣", "彰化縣", "南投縣", "雲林縣", "嘉義縣", "屏東縣", "宜蘭縣", "花蓮縣",
    "台東縣", "澎湖縣", "金門縣", "連江縣",
];

/// 比對不到縣市時使用的分組名稱
pub const UNKNOWN_REGION: &str = "(未知)";

static REGION_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = TAIWAN_REGIONS
        .iter()
        .map(|r| regex::escape(r))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&pattern).expect("valid region regex")
});

pub fn normalize_address(address: &str) -> String {
    address
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == '臺' { '台' } else { c })
        .collect()
}

/// 取地址中最先出現的縣市名稱
pub fn extract_region(address: &str) -> Option<&'static str> {
    let normalized = normalize_address(address);
    let found = REGION_RE.find(&normalized)?;
    TAIWAN_REGIONS
        .iter()
        .copied()
        .find(|region| *region == found.as_str())
}
