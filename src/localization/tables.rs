// Korean label tables
// Author: kelexine (https://github.com/kelexine)

use phf::phf_map;

/// Keys are normalized: trimmed, lower-cased, single spaces.
pub static SHAPE_KO: phf::Map<&'static str, &'static str> = phf_map! {
    "oval" => "계란형",
    "oblong" => "긴형",
    "long" => "긴형",
    "round" => "둥근형",
    "square" => "사각형",
    "heart" => "하트형",
    "diamond" => "다이아몬드형",
    "triangle" => "삼각형",
    "inverted triangle" => "역삼각형",
    "inverted_triangle" => "역삼각형",
};

pub static SEASON_KO: phf::Map<&'static str, &'static str> = phf_map! {
    "spring" => "봄 웜",
    "summer" => "여름 쿨",
    "autumn" => "가을 웜",
    "fall" => "가을 웜",
    "winter" => "겨울 쿨",
};

pub static TONE_KO: phf::Map<&'static str, &'static str> = phf_map! {
    "warm" => "웜",
    "cool" => "쿨",
};

pub const MESSAGE_COMPLETED: &str = "분석이 완료되었습니다.";
pub const MESSAGE_EMPTY_RESPONSE: &str = "서버 응답이 비어 있습니다.";

/// User-facing message for an upstream error code.
pub fn error_message(code: &str) -> &'static str {
    match code {
        "NO_FACE" => "얼굴을 찾지 못했습니다. 정면 사진으로 다시 시도해 주세요.",
        "LOW_QUALITY" => "이미지 품질이 낮아 분석할 수 없습니다.",
        "INVALID_IMAGE" => "이미지 데이터가 올바르지 않습니다.",
        _ => "분석 중 오류가 발생했습니다.",
    }
}
