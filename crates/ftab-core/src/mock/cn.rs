//! Mainland China data generator.

use rand::seq::SliceRandom;
use rand::Rng;

use super::Mocker;

/// GB2260 administrative division codes used as id card prefixes.
const REGIONS: &[&str] = &[
    "110101", "110105", "120101", "310101", "310104", "320102", "330102", "420102", "440103",
    "440305", "500103", "510104", "610102",
];

/// GB11643 weights for the first 17 digits.
const WEIGHTS: [u32; 17] = [7, 9, 10, 5, 8, 4, 2, 1, 6, 3, 7, 9, 10, 5, 8, 4, 2];

/// Check character indexed by the weighted sum modulo 11.
const CHECK_CODES: [char; 11] = ['1', '0', 'X', '9', '8', '7', '6', '5', '4', '3', '2'];

const MOBILE_PREFIXES: &[&str] = &[
    "139", "137", "135", "133", "131", "150", "153", "155", "157", "159", "188", "187", "189",
    "179", "170", "173", "175",
];

const EMAIL_DOMAINS: &[&str] = &["qq.com", "163.com", "126.com", "gmail.com"];

const SURNAMES: &str = "赵钱孙李周吴郑王冯陈褚卫蒋沈韩杨朱秦尤许何吕施张孔曹严华金魏陶姜谢邹柏窦章苏潘范彭鲁马方任袁柳唐薛雷贺罗郝常于傅齐康伍余顾孟黄穆萧姚邵汪毛贝成戴宋庞熊纪舒董梁杜江郭林钟徐邱高夏蔡田胡霍万卢莫丁邓洪石崔程陆叶刘白";

const GIVEN_NAMES: &str = "锦青倩婷婉瑾颖露瑶怡雁仪荷丹蓉君琴蕊薇梦岚韵卿聪澜悦昭冰羽希宁欣晓欢枫芸菲思丽秀娟英华慧美娜静淑惠玉萍玲芳燕春珍莉兰凤洁梅琳云雪霞月佳涛进坚博诚敬振壮群豪乐磊民浩亮谦翰朗宏鸣鹏泽晨士建家德泰盛伟刚勇毅俊峰强军平东文辉明永健广志义兴良海山仁波福龙元国胜学祥达安中武新清飞彬顺信杰航";

const DIGITS: &[u8] = b"0123456789";
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Mocker for the `cn` locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct CnMocker;

impl CnMocker {
    pub fn new() -> Self {
        Self
    }
}

fn pick<'a>(items: &[&'a str]) -> &'a str {
    items.choose(&mut rand::thread_rng()).copied().unwrap_or_default()
}

fn random_ascii(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

fn random_chars(alphabet: &str, len: usize) -> String {
    let chars: Vec<char> = alphabet.chars().collect();
    let mut rng = rand::thread_rng();
    (0..len)
        .filter_map(|_| chars.choose(&mut rng).copied())
        .collect()
}

/// GB11643 check character for the first 17 digits of an id card number.
/// `None` if `body` is not exactly 17 ASCII digits.
pub fn id_card_check_code(body: &str) -> Option<char> {
    if body.len() != WEIGHTS.len() {
        return None;
    }
    let mut sum = 0;
    for (c, weight) in body.chars().zip(WEIGHTS) {
        sum += c.to_digit(10)? * weight;
    }
    Some(CHECK_CODES[(sum % 11) as usize])
}

impl Mocker for CnMocker {
    fn id_card(&self) -> String {
        let mut rng = rand::thread_rng();
        let body = format!(
            "{}{}{:02}{:02}{:03}",
            pick(REGIONS),
            1950 + rng.gen_range(0..50),
            rng.gen_range(1..=12),
            rng.gen_range(1..=28),
            rng.gen_range(0..1000),
        );
        match id_card_check_code(&body) {
            Some(check) => format!("{body}{check}"),
            None => body,
        }
    }

    fn email(&self) -> String {
        format!(
            "{}{}@{}",
            random_ascii(LETTERS, 6),
            random_ascii(DIGITS, 4),
            pick(EMAIL_DOMAINS)
        )
    }

    fn mobile(&self) -> String {
        format!("{}{}", pick(MOBILE_PREFIXES), random_ascii(DIGITS, 8))
    }

    /// One-character surname and a one- or two-character given name.
    fn name(&self) -> String {
        let given = rand::thread_rng().gen_range(1..=2);
        random_chars(SURNAMES, 1) + &random_chars(GIVEN_NAMES, given)
    }
}
