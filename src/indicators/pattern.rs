//! Candlestick pattern recognition.
//!
//! Each recognizer returns one value per bar: `100` for a bullish match,
//! `-100` for a bearish one, `0` otherwise (`±200` marks a confirmed hikkake).
//! Bars without enough history for the candle averages are undefined.
//!
//! "Long", "short", "doji" and friends are judged against the average size
//! of the preceding candles, following the TA-Lib candle settings.

/// What part of a candle a setting measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RangeType {
    RealBody,
    HighLow,
    Shadows,
}

/// Reference size used to classify a candle part
#[derive(Debug, Clone, Copy)]
pub struct CandleSetting {
    range: RangeType,
    period: usize,
    factor: f64,
}

const fn setting(range: RangeType, period: usize, factor: f64) -> CandleSetting {
    CandleSetting { range, period, factor }
}

const BODY_LONG: CandleSetting = setting(RangeType::RealBody, 10, 1.0);
const BODY_SHORT: CandleSetting = setting(RangeType::RealBody, 10, 1.0);
const BODY_DOJI: CandleSetting = setting(RangeType::HighLow, 10, 0.1);
const SHADOW_LONG: CandleSetting = setting(RangeType::RealBody, 0, 1.0);
const SHADOW_VERY_LONG: CandleSetting = setting(RangeType::RealBody, 0, 2.0);
const SHADOW_SHORT: CandleSetting = setting(RangeType::Shadows, 10, 1.0);
const SHADOW_VERY_SHORT: CandleSetting = setting(RangeType::HighLow, 10, 0.1);
const NEAR: CandleSetting = setting(RangeType::HighLow, 5, 0.2);
const FAR: CandleSetting = setting(RangeType::HighLow, 5, 0.6);
const EQUAL: CandleSetting = setting(RangeType::HighLow, 5, 0.05);

/// Longest averaging period among the settings
const MAX_AVERAGE_PERIOD: usize = 10;

const ABANDONED_BABY_PENETRATION: f64 = 0.3;
const STAR_PENETRATION: f64 = 0.3;
const DARK_CLOUD_PENETRATION: f64 = 0.5;
const MAT_HOLD_PENETRATION: f64 = 0.5;

/// Borrowed OHLC columns
#[derive(Debug, Clone, Copy)]
pub struct Candles<'a> {
    pub open: &'a [f64],
    pub high: &'a [f64],
    pub low: &'a [f64],
    pub close: &'a [f64],
}

impl<'a> Candles<'a> {
    pub fn new(open: &'a [f64], high: &'a [f64], low: &'a [f64], close: &'a [f64]) -> Self {
        Self { open, high, low, close }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    fn body(&self, i: usize) -> f64 {
        (self.close[i] - self.open[i]).abs()
    }

    fn top(&self, i: usize) -> f64 {
        self.open[i].max(self.close[i])
    }

    fn bottom(&self, i: usize) -> f64 {
        self.open[i].min(self.close[i])
    }

    fn upper_shadow(&self, i: usize) -> f64 {
        self.high[i] - self.top(i)
    }

    fn lower_shadow(&self, i: usize) -> f64 {
        self.bottom(i) - self.low[i]
    }

    fn high_low(&self, i: usize) -> f64 {
        self.high[i] - self.low[i]
    }

    /// 1 for white (close >= open), -1 for black
    fn color(&self, i: usize) -> i32 {
        if self.close[i] >= self.open[i] {
            1
        } else {
            -1
        }
    }

    fn white(&self, i: usize) -> bool {
        self.color(i) == 1
    }

    fn black(&self, i: usize) -> bool {
        self.color(i) == -1
    }

    /// Real body of `later` entirely above the real body of `earlier`
    fn body_gap_up(&self, later: usize, earlier: usize) -> bool {
        self.bottom(later) > self.top(earlier)
    }

    fn body_gap_down(&self, later: usize, earlier: usize) -> bool {
        self.top(later) < self.bottom(earlier)
    }

    fn candle_gap_up(&self, later: usize, earlier: usize) -> bool {
        self.low[later] > self.high[earlier]
    }

    fn candle_gap_down(&self, later: usize, earlier: usize) -> bool {
        self.high[later] < self.low[earlier]
    }

    fn range_of(&self, range: RangeType, i: usize) -> f64 {
        match range {
            RangeType::RealBody => self.body(i),
            RangeType::HighLow => self.high_low(i),
            RangeType::Shadows => self.upper_shadow(i) + self.lower_shadow(i),
        }
    }

    /// Reference size for candle `i`: the mean range of the `period`
    /// candles before it, or candle `i` itself for zero-period settings
    fn avg(&self, s: CandleSetting, i: usize) -> f64 {
        let base = if s.period == 0 {
            self.range_of(s.range, i)
        } else {
            (i - s.period..i).map(|j| self.range_of(s.range, j)).sum::<f64>() / s.period as f64
        };
        let halves = if s.range == RangeType::Shadows { 2.0 } else { 1.0 };
        s.factor * base / halves
    }

    fn is_long(&self, i: usize) -> bool {
        self.body(i) > self.avg(BODY_LONG, i)
    }

    fn is_short(&self, i: usize) -> bool {
        self.body(i) < self.avg(BODY_SHORT, i)
    }

    fn is_doji(&self, i: usize) -> bool {
        self.body(i) <= self.avg(BODY_DOJI, i)
    }

    fn within(&self, value: f64, target: f64, s: CandleSetting, i: usize) -> bool {
        let tolerance = self.avg(s, i);
        value >= target - tolerance && value <= target + tolerance
    }
}

/// Evaluates `rule` on every bar that has `span` candles plus the averaging
/// history behind them
fn scan<F>(c: &Candles, span: usize, rule: F) -> Vec<f64>
where
    F: Fn(&Candles, usize) -> i32,
{
    let lookback = span - 1 + MAX_AVERAGE_PERIOD;
    (0..c.len())
        .map(|i| if i < lookback { f64::NAN } else { rule(c, i) as f64 })
        .collect()
}

pub type PatternFn = fn(&Candles) -> Vec<f64>;

/// Every recognizer with the feature name it is stored under
pub const CANDLE_PATTERNS: [(&str, PatternFn); 61] = [
    ("CDL2CROWS", cdl2crows),
    ("CDL3BLACKCROWS", cdl3blackcrows),
    ("CDL3INSIDE", cdl3inside),
    ("CDL3LINESTRIKE", cdl3linestrike),
    ("CDL3OUTSIDE", cdl3outside),
    ("CDL3STARSINSOUTH", cdl3starsinsouth),
    ("CDL3WHITESOLDIERS", cdl3whitesoldiers),
    ("CDLABANDONEDBABY", cdlabandonedbaby),
    ("CDLADVANCEBLOCK", cdladvanceblock),
    ("CDLBELTHOLD", cdlbelthold),
    ("CDLBREAKAWAY", cdlbreakaway),
    ("CDLCLOSINGMARUBOZU", cdlclosingmarubozu),
    ("CDLCONCEALBABYSWALL", cdlconcealbabyswall),
    ("CDLCOUNTERATTACK", cdlcounterattack),
    ("CDLDARKCLOUDCOVER", cdldarkcloudcover),
    ("CDLDOJI", cdldoji),
    ("CDLDOJISTAR", cdldojistar),
    ("CDLDRAGONFLYDOJI", cdldragonflydoji),
    ("CDLENGULFING", cdlengulfing),
    ("CDLEVENINGDOJISTAR", cdleveningdojistar),
    ("CDLEVENINGSTAR", cdleveningstar),
    ("CDLGAPSIDESIDEWHITE", cdlgapsidesidewhite),
    ("CDLGRAVESTONEDOJI", cdlgravestonedoji),
    ("CDLHAMMER", cdlhammer),
    ("CDLHANGINGMAN", cdlhangingman),
    ("CDLHARAMI", cdlharami),
    ("CDLHARAMICROSS", cdlharamicross),
    ("CDLHIGHWAVE", cdlhighwave),
    ("CDLHIKKAKE", cdlhikkake),
    ("CDLHIKKAKEMOD", cdlhikkakemod),
    ("CDLHOMINGPIGEON", cdlhomingpigeon),
    ("CDLIDENTICAL3CROWS", cdlidentical3crows),
    ("CDLINNECK", cdlinneck),
    ("CDLINVERTEDHAMMER", cdlinvertedhammer),
    ("CDLKICKING", cdlkicking),
    ("CDLKICKINGBYLENGTH", cdlkickingbylength),
    ("CDLLADDERBOTTOM", cdlladderbottom),
    ("CDLLONGLEGGEDDOJI", cdllongleggeddoji),
    ("CDLLONGLINE", cdllongline),
    ("CDLMARUBOZU", cdlmarubozu),
    ("CDLMATCHINGLOW", cdlmatchinglow),
    ("CDLMATHOLD", cdlmathold),
    ("CDLMORNINGDOJISTAR", cdlmorningdojistar),
    ("CDLMORNINGSTAR", cdlmorningstar),
    ("CDLONNECK", cdlonneck),
    ("CDLPIERCING", cdlpiercing),
    ("CDLRICKSHAWMAN", cdlrickshawman),
    ("CDLRISEFALL3METHODS", cdlrisefall3methods),
    ("CDLSEPARATINGLINES", cdlseparatinglines),
    ("CDLSHOOTINGSTAR", cdlshootingstar),
    ("CDLSHORTLINE", cdlshortline),
    ("CDLSPINNINGTOP", cdlspinningtop),
    ("CDLSTALLEDPATTERN", cdlstalledpattern),
    ("CDLSTICKSANDWICH", cdlsticksandwich),
    ("CDLTAKURI", cdltakuri),
    ("CDLTASUKIGAP", cdltasukigap),
    ("CDLTHRUSTING", cdlthrusting),
    ("CDLTRISTAR", cdltristar),
    ("CDLUNIQUE3RIVER", cdlunique3river),
    ("CDLUPSIDEGAP2CROWS", cdlupsidegap2crows),
    ("CDLXSIDEGAP3METHODS", cdlxsidegap3methods),
];

// ---------------------------------------------------------------------------
// Single candle patterns
// ---------------------------------------------------------------------------

pub fn cdlbelthold(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        let svs = c.avg(SHADOW_VERY_SHORT, i);
        let opening_side = if c.white(i) { c.lower_shadow(i) } else { c.upper_shadow(i) };
        if c.is_long(i) && opening_side < svs {
            c.color(i) * 100
        } else {
            0
        }
    })
}

pub fn cdlclosingmarubozu(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        let svs = c.avg(SHADOW_VERY_SHORT, i);
        let closing_side = if c.white(i) { c.upper_shadow(i) } else { c.lower_shadow(i) };
        if c.is_long(i) && closing_side < svs {
            c.color(i) * 100
        } else {
            0
        }
    })
}

pub fn cdldoji(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| if c.is_doji(i) { 100 } else { 0 })
}

pub fn cdldragonflydoji(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        let svs = c.avg(SHADOW_VERY_SHORT, i);
        if c.is_doji(i) && c.upper_shadow(i) < svs && c.lower_shadow(i) > svs {
            100
        } else {
            0
        }
    })
}

pub fn cdlgravestonedoji(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        let svs = c.avg(SHADOW_VERY_SHORT, i);
        if c.is_doji(i) && c.lower_shadow(i) < svs && c.upper_shadow(i) > svs {
            100
        } else {
            0
        }
    })
}

pub fn cdlhighwave(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        let svl = c.avg(SHADOW_VERY_LONG, i);
        if c.is_short(i) && c.upper_shadow(i) > svl && c.lower_shadow(i) > svl {
            c.color(i) * 100
        } else {
            0
        }
    })
}

pub fn cdllongleggeddoji(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        let sl = c.avg(SHADOW_LONG, i);
        if c.is_doji(i) && (c.lower_shadow(i) > sl || c.upper_shadow(i) > sl) {
            100
        } else {
            0
        }
    })
}

pub fn cdllongline(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        let ss = c.avg(SHADOW_SHORT, i);
        if c.is_long(i) && c.upper_shadow(i) < ss && c.lower_shadow(i) < ss {
            c.color(i) * 100
        } else {
            0
        }
    })
}

pub fn cdlmarubozu(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        let svs = c.avg(SHADOW_VERY_SHORT, i);
        if c.is_long(i) && c.upper_shadow(i) < svs && c.lower_shadow(i) < svs {
            c.color(i) * 100
        } else {
            0
        }
    })
}

pub fn cdlrickshawman(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        let sl = c.avg(SHADOW_LONG, i);
        let near = c.avg(NEAR, i);
        let mid = c.low[i] + c.high_low(i) / 2.0;
        if c.is_doji(i)
            && c.lower_shadow(i) > sl
            && c.upper_shadow(i) > sl
            && c.bottom(i) <= mid + near
            && c.top(i) >= mid - near
        {
            100
        } else {
            0
        }
    })
}

pub fn cdlshortline(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        let ss = c.avg(SHADOW_SHORT, i);
        if c.is_short(i) && c.upper_shadow(i) < ss && c.lower_shadow(i) < ss {
            c.color(i) * 100
        } else {
            0
        }
    })
}

pub fn cdlspinningtop(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        let body = c.body(i);
        if c.is_short(i) && c.upper_shadow(i) > body && c.lower_shadow(i) > body {
            c.color(i) * 100
        } else {
            0
        }
    })
}

pub fn cdltakuri(c: &Candles) -> Vec<f64> {
    scan(c, 1, |c, i| {
        if c.is_doji(i)
            && c.upper_shadow(i) < c.avg(SHADOW_VERY_SHORT, i)
            && c.lower_shadow(i) > c.avg(SHADOW_VERY_LONG, i)
        {
            100
        } else {
            0
        }
    })
}

// ---------------------------------------------------------------------------
// Two candle patterns
// ---------------------------------------------------------------------------

pub fn cdlcounterattack(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.color(first) == -c.color(i)
            && c.is_long(first)
            && c.is_long(i)
            && c.within(c.close[i], c.close[first], EQUAL, first)
        {
            c.color(i) * 100
        } else {
            0
        }
    })
}

pub fn cdldarkcloudcover(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.white(first)
            && c.is_long(first)
            && c.black(i)
            && c.open[i] > c.high[first]
            && c.close[i] > c.open[first]
            && c.close[i] < c.close[first] - c.body(first) * DARK_CLOUD_PENETRATION
        {
            -100
        } else {
            0
        }
    })
}

pub fn cdldojistar(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        let gapped = (c.white(first) && c.body_gap_up(i, first))
            || (c.black(first) && c.body_gap_down(i, first));
        if c.is_long(first) && c.is_doji(i) && gapped {
            -c.color(first) * 100
        } else {
            0
        }
    })
}

pub fn cdlengulfing(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        let (o1, c1, o2, c2) = (c.open[first], c.close[first], c.open[i], c.close[i]);
        if c.white(i) && c.black(first) && ((c2 >= o1 && o2 < c1) || (c2 > o1 && o2 <= c1)) {
            100
        } else if c.black(i) && c.white(first) && ((o2 >= c1 && c2 < o1) || (o2 > c1 && c2 <= o1)) {
            -100
        } else {
            0
        }
    })
}

/// Small body, long lower shadow, almost no upper shadow
fn hammer_shape(c: &Candles, i: usize) -> bool {
    c.is_short(i)
        && c.lower_shadow(i) > c.avg(SHADOW_LONG, i)
        && c.upper_shadow(i) < c.avg(SHADOW_VERY_SHORT, i)
}

pub fn cdlhammer(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if hammer_shape(c, i) && c.bottom(i) <= c.low[first] + c.avg(NEAR, first) {
            100
        } else {
            0
        }
    })
}

pub fn cdlhangingman(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if hammer_shape(c, i) && c.bottom(i) >= c.high[first] - c.avg(NEAR, first) {
            -100
        } else {
            0
        }
    })
}

fn inside_body(c: &Candles, inner: usize, outer: usize) -> bool {
    c.top(inner) < c.top(outer) && c.bottom(inner) > c.bottom(outer)
}

pub fn cdlharami(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.is_long(first) && c.body(i) <= c.avg(BODY_SHORT, i) && inside_body(c, i, first) {
            -c.color(first) * 100
        } else {
            0
        }
    })
}

pub fn cdlharamicross(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.is_long(first) && c.is_doji(i) && inside_body(c, i, first) {
            -c.color(first) * 100
        } else {
            0
        }
    })
}

pub fn cdlhomingpigeon(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.black(first)
            && c.black(i)
            && c.is_long(first)
            && c.body(i) <= c.avg(BODY_SHORT, i)
            && c.open[i] < c.open[first]
            && c.close[i] > c.close[first]
        {
            100
        } else {
            0
        }
    })
}

pub fn cdlinneck(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.black(first)
            && c.is_long(first)
            && c.white(i)
            && c.open[i] < c.low[first]
            && c.close[i] <= c.close[first] + c.avg(EQUAL, first)
            && c.close[i] >= c.close[first]
        {
            -100
        } else {
            0
        }
    })
}

pub fn cdlinvertedhammer(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.is_short(i)
            && c.upper_shadow(i) > c.avg(SHADOW_LONG, i)
            && c.lower_shadow(i) < c.avg(SHADOW_VERY_SHORT, i)
            && c.body_gap_down(i, first)
        {
            100
        } else {
            0
        }
    })
}

fn is_marubozu(c: &Candles, i: usize) -> bool {
    let svs = c.avg(SHADOW_VERY_SHORT, i);
    c.is_long(i) && c.upper_shadow(i) < svs && c.lower_shadow(i) < svs
}

/// Opposite colored marubozu pair separated by a gap in the direction of
/// the second candle
fn kicking_pair(c: &Candles, i: usize) -> bool {
    let first = i - 1;
    c.color(first) == -c.color(i)
        && is_marubozu(c, first)
        && is_marubozu(c, i)
        && ((c.black(first) && c.candle_gap_up(i, first))
            || (c.white(first) && c.candle_gap_down(i, first)))
}

pub fn cdlkicking(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| if kicking_pair(c, i) { c.color(i) * 100 } else { 0 })
}

pub fn cdlkickingbylength(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        if !kicking_pair(c, i) {
            return 0;
        }
        let longer = if c.body(i) > c.body(i - 1) { i } else { i - 1 };
        c.color(longer) * 100
    })
}

pub fn cdlmatchinglow(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.black(first) && c.black(i) && c.within(c.close[i], c.close[first], EQUAL, first) {
            100
        } else {
            0
        }
    })
}

pub fn cdlonneck(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.black(first)
            && c.is_long(first)
            && c.white(i)
            && c.open[i] < c.low[first]
            && c.within(c.close[i], c.low[first], EQUAL, first)
        {
            -100
        } else {
            0
        }
    })
}

pub fn cdlpiercing(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.black(first)
            && c.is_long(first)
            && c.white(i)
            && c.is_long(i)
            && c.open[i] < c.low[first]
            && c.close[i] < c.open[first]
            && c.close[i] > c.close[first] + c.body(first) * 0.5
        {
            100
        } else {
            0
        }
    })
}

pub fn cdlseparatinglines(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        let svs = c.avg(SHADOW_VERY_SHORT, i);
        let opening_side = if c.white(i) { c.lower_shadow(i) } else { c.upper_shadow(i) };
        if c.color(first) == -c.color(i)
            && c.within(c.open[i], c.open[first], EQUAL, first)
            && c.is_long(i)
            && opening_side < svs
        {
            c.color(i) * 100
        } else {
            0
        }
    })
}

pub fn cdlshootingstar(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.is_short(i)
            && c.upper_shadow(i) > c.avg(SHADOW_LONG, i)
            && c.lower_shadow(i) < c.avg(SHADOW_VERY_SHORT, i)
            && c.body_gap_up(i, first)
        {
            -100
        } else {
            0
        }
    })
}

pub fn cdlthrusting(c: &Candles) -> Vec<f64> {
    scan(c, 2, |c, i| {
        let first = i - 1;
        if c.black(first)
            && c.is_long(first)
            && c.white(i)
            && c.open[i] < c.low[first]
            && c.close[i] > c.close[first] + c.avg(EQUAL, first)
            && c.close[i] <= c.close[first] + c.body(first) * 0.5
        {
            -100
        } else {
            0
        }
    })
}

// ---------------------------------------------------------------------------
// Three candle patterns
// ---------------------------------------------------------------------------

pub fn cdl2crows(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        if c.white(first)
            && c.is_long(first)
            && c.black(second)
            && c.body_gap_up(second, first)
            && c.black(i)
            && c.open[i] < c.open[second]
            && c.open[i] > c.close[second]
            && c.close[i] > c.open[first]
            && c.close[i] < c.close[first]
        {
            -100
        } else {
            0
        }
    })
}

pub fn cdl3inside(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        let confirmed = (c.white(first) && c.black(i) && c.close[i] < c.open[first])
            || (c.black(first) && c.white(i) && c.close[i] > c.open[first]);
        if c.is_long(first)
            && c.body(second) <= c.avg(BODY_SHORT, second)
            && inside_body(c, second, first)
            && confirmed
        {
            -c.color(first) * 100
        } else {
            0
        }
    })
}

pub fn cdl3outside(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        let (o1, c1, o2, c2) = (c.open[first], c.close[first], c.open[second], c.close[second]);
        if c.white(second) && c.black(first) && c2 > o1 && o2 < c1 && c.close[i] > c2 {
            100
        } else if c.black(second) && c.white(first) && o2 > c1 && c2 < o1 && c.close[i] < c2 {
            -100
        } else {
            0
        }
    })
}

pub fn cdl3starsinsouth(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        let first_ok = c.black(first)
            && c.is_long(first)
            && c.lower_shadow(first) > c.avg(SHADOW_LONG, first);
        let second_ok = c.black(second)
            && c.body(second) < c.body(first)
            && c.open[second] > c.close[first]
            && c.open[second] <= c.high[first]
            && c.low[second] < c.close[first]
            && c.low[second] >= c.low[first]
            && c.lower_shadow(second) > c.avg(SHADOW_VERY_SHORT, second);
        let svs = c.avg(SHADOW_VERY_SHORT, i);
        let third_ok = c.black(i)
            && c.is_short(i)
            && c.lower_shadow(i) < svs
            && c.upper_shadow(i) < svs
            && c.low[i] > c.low[second]
            && c.high[i] < c.high[second];
        if first_ok && second_ok && third_ok {
            100
        } else {
            0
        }
    })
}

pub fn cdl3whitesoldiers(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        let candles = [first, second, i];
        let all_white = candles.iter().all(|&k| c.white(k));
        let short_tops = candles
            .iter()
            .all(|&k| c.upper_shadow(k) < c.avg(SHADOW_VERY_SHORT, k));
        if all_white
            && short_tops
            && c.close[i] > c.close[second]
            && c.close[second] > c.close[first]
            && c.open[second] > c.open[first]
            && c.open[second] <= c.close[first] + c.avg(NEAR, first)
            && c.open[i] > c.open[second]
            && c.open[i] <= c.close[second] + c.avg(NEAR, second)
            && c.body(second) > c.body(first) - c.avg(FAR, first)
            && c.body(i) > c.body(second) - c.avg(FAR, second)
            && c.body(i) > c.avg(BODY_SHORT, i)
        {
            100
        } else {
            0
        }
    })
}

pub fn cdlabandonedbaby(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        if !(c.is_long(first) && c.is_doji(second) && c.body(i) > c.avg(BODY_SHORT, i)) {
            return 0;
        }
        let reach = c.body(first) * ABANDONED_BABY_PENETRATION;
        if c.white(first)
            && c.black(i)
            && c.close[i] < c.close[first] - reach
            && c.candle_gap_up(second, first)
            && c.candle_gap_down(i, second)
        {
            -100
        } else if c.black(first)
            && c.white(i)
            && c.close[i] > c.close[first] + reach
            && c.candle_gap_down(second, first)
            && c.candle_gap_up(i, second)
        {
            100
        } else {
            0
        }
    })
}

pub fn cdladvanceblock(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        let rising = c.white(first)
            && c.white(second)
            && c.white(i)
            && c.close[i] > c.close[second]
            && c.close[second] > c.close[first]
            && c.open[second] > c.open[first]
            && c.open[second] <= c.close[first] + c.avg(NEAR, first)
            && c.open[i] > c.open[second]
            && c.open[i] <= c.close[second] + c.avg(NEAR, second)
            && c.is_long(first)
            && c.upper_shadow(first) < c.avg(SHADOW_SHORT, first);
        if !rising {
            return 0;
        }
        let (b1, b2, b3) = (c.body(first), c.body(second), c.body(i));
        let weakening = (b2 <= b1 - c.avg(FAR, first) && b3 < b2 + c.avg(NEAR, second))
            || b3 <= b2 - c.avg(FAR, second)
            || (b3 < b2
                && b2 < b1
                && (c.upper_shadow(i) > c.avg(SHADOW_SHORT, i)
                    || c.upper_shadow(second) > c.avg(SHADOW_SHORT, second)))
            || (b3 < b2 && c.upper_shadow(i) > c.avg(SHADOW_LONG, i));
        if weakening {
            -100
        } else {
            0
        }
    })
}

/// Shared body of the evening/morning star family
fn star(c: &Candles, i: usize, doji: bool, bullish: bool) -> bool {
    let (first, second) = (i - 2, i - 1);
    let small_middle = if doji {
        c.is_doji(second)
    } else {
        c.body(second) <= c.avg(BODY_SHORT, second)
    };
    let reach = c.body(first) * STAR_PENETRATION;
    let third_ok = c.body(i) > c.avg(BODY_SHORT, i);
    if bullish {
        c.black(first)
            && c.is_long(first)
            && small_middle
            && c.body_gap_down(second, first)
            && c.white(i)
            && third_ok
            && c.close[i] > c.close[first] + reach
    } else {
        c.white(first)
            && c.is_long(first)
            && small_middle
            && c.body_gap_up(second, first)
            && c.black(i)
            && third_ok
            && c.close[i] < c.close[first] - reach
    }
}

pub fn cdleveningdojistar(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| if star(c, i, true, false) { -100 } else { 0 })
}

pub fn cdleveningstar(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| if star(c, i, false, false) { -100 } else { 0 })
}

pub fn cdlmorningdojistar(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| if star(c, i, true, true) { 100 } else { 0 })
}

pub fn cdlmorningstar(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| if star(c, i, false, true) { 100 } else { 0 })
}

pub fn cdlgapsidesidewhite(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        let up = c.body_gap_up(second, first) && c.body_gap_up(i, first);
        let down = c.body_gap_down(second, first) && c.body_gap_down(i, first);
        if (up || down)
            && c.white(second)
            && c.white(i)
            && c.within(c.body(i), c.body(second), NEAR, second)
            && c.within(c.open[i], c.open[second], EQUAL, second)
        {
            if up {
                100
            } else {
                -100
            }
        } else {
            0
        }
    })
}

pub fn cdlidentical3crows(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        let candles = [first, second, i];
        if candles.iter().all(|&k| c.black(k))
            && candles
                .iter()
                .all(|&k| c.lower_shadow(k) < c.avg(SHADOW_VERY_SHORT, k))
            && c.close[first] > c.close[second]
            && c.close[second] > c.close[i]
            && c.within(c.open[second], c.close[first], EQUAL, first)
            && c.within(c.open[i], c.close[second], EQUAL, second)
        {
            -100
        } else {
            0
        }
    })
}

pub fn cdlstalledpattern(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        if c.white(first)
            && c.white(second)
            && c.white(i)
            && c.close[i] > c.close[second]
            && c.close[second] > c.close[first]
            && c.is_long(first)
            && c.is_long(second)
            && c.upper_shadow(second) < c.avg(SHADOW_VERY_SHORT, second)
            && c.open[second] > c.open[first]
            && c.open[second] <= c.close[first] + c.avg(NEAR, first)
            && c.is_short(i)
            && c.open[i] >= c.close[second] - c.body(i) - c.avg(NEAR, second)
        {
            -100
        } else {
            0
        }
    })
}

pub fn cdlsticksandwich(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        if c.black(first)
            && c.white(second)
            && c.black(i)
            && c.low[second] > c.close[first]
            && c.within(c.close[i], c.close[first], EQUAL, first)
        {
            100
        } else {
            0
        }
    })
}

pub fn cdltasukigap(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        let similar = (c.body(second) - c.body(i)).abs() < c.avg(NEAR, second);
        if !similar {
            return 0;
        }
        if c.body_gap_up(second, first)
            && c.white(second)
            && c.black(i)
            && c.open[i] < c.close[second]
            && c.open[i] > c.open[second]
            && c.close[i] < c.open[second]
            && c.close[i] > c.top(first)
        {
            100
        } else if c.body_gap_down(second, first)
            && c.black(second)
            && c.white(i)
            && c.open[i] < c.open[second]
            && c.open[i] > c.close[second]
            && c.close[i] > c.open[second]
            && c.close[i] < c.bottom(first)
        {
            -100
        } else {
            0
        }
    })
}

pub fn cdltristar(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        // all three bodies are judged against the first candle's average
        let doji = c.avg(BODY_DOJI, first);
        if !(c.body(first) <= doji && c.body(second) <= doji && c.body(i) <= doji) {
            return 0;
        }
        if c.body_gap_up(second, first) && c.top(i) < c.top(second) {
            -100
        } else if c.body_gap_down(second, first) && c.bottom(i) > c.bottom(second) {
            100
        } else {
            0
        }
    })
}

pub fn cdlunique3river(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        if c.black(first)
            && c.is_long(first)
            && c.black(second)
            && c.close[second] > c.close[first]
            && c.open[second] <= c.open[first]
            && c.low[second] < c.low[first]
            && c.white(i)
            && c.is_short(i)
            && c.open[i] > c.low[second]
            && c.close[i] < c.close[second]
        {
            100
        } else {
            0
        }
    })
}

pub fn cdlupsidegap2crows(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        if c.white(first)
            && c.is_long(first)
            && c.black(second)
            && c.body(second) <= c.avg(BODY_SHORT, second)
            && c.body_gap_up(second, first)
            && c.black(i)
            && c.open[i] > c.open[second]
            && c.close[i] < c.close[second]
            && c.close[i] > c.close[first]
        {
            -100
        } else {
            0
        }
    })
}

pub fn cdlxsidegap3methods(c: &Candles) -> Vec<f64> {
    scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        let gapped = (c.white(first) && c.body_gap_up(second, first))
            || (c.black(first) && c.body_gap_down(second, first));
        if c.color(first) == c.color(second)
            && c.color(i) == -c.color(second)
            && c.open[i] < c.top(second)
            && c.open[i] > c.bottom(second)
            && c.close[i] < c.top(first)
            && c.close[i] > c.bottom(first)
            && gapped
        {
            c.color(first) * 100
        } else {
            0
        }
    })
}

/// Inside bar followed by a breakout bar; the signal is upgraded to ±200
/// when a close beyond the inside bar confirms it within three bars
fn hikkake_scan<F>(c: &Candles, span: usize, setup: F) -> Vec<f64>
where
    F: Fn(&Candles, usize) -> i32,
{
    let lookback = span - 1 + MAX_AVERAGE_PERIOD;
    let mut out = vec![f64::NAN; c.len()];
    let mut pattern_idx = 0usize;
    let mut pattern_result = 0i32;
    for i in lookback..c.len() {
        let signal = setup(c, i);
        if signal != 0 {
            pattern_result = signal;
            pattern_idx = i;
            out[i] = signal as f64;
        } else if pattern_idx > 0 && i <= pattern_idx + 3 {
            let inside = pattern_idx - 1;
            let confirmed = (pattern_result > 0 && c.close[i] > c.high[inside])
                || (pattern_result < 0 && c.close[i] < c.low[inside]);
            if confirmed {
                out[i] = (pattern_result + 100 * pattern_result.signum()) as f64;
                pattern_idx = 0;
            } else {
                out[i] = 0.0;
            }
        } else {
            out[i] = 0.0;
        }
    }
    out
}

pub fn cdlhikkake(c: &Candles) -> Vec<f64> {
    hikkake_scan(c, 3, |c, i| {
        let (first, second) = (i - 2, i - 1);
        let inside = c.high[second] < c.high[first] && c.low[second] > c.low[first];
        if !inside {
            0
        } else if c.high[i] < c.high[second] && c.low[i] < c.low[second] {
            100
        } else if c.high[i] > c.high[second] && c.low[i] > c.low[second] {
            -100
        } else {
            0
        }
    })
}

pub fn cdlhikkakemod(c: &Candles) -> Vec<f64> {
    hikkake_scan(c, 4, |c, i| {
        let (first, second, third) = (i - 3, i - 2, i - 1);
        let nested = c.high[second] < c.high[first]
            && c.low[second] > c.low[first]
            && c.high[third] < c.high[second]
            && c.low[third] > c.low[second];
        if !nested {
            return 0;
        }
        let near = c.avg(NEAR, second);
        if c.high[i] < c.high[third]
            && c.low[i] < c.low[third]
            && c.close[second] <= c.low[second] + near
        {
            100
        } else if c.high[i] > c.high[third]
            && c.low[i] > c.low[third]
            && c.close[second] >= c.high[second] - near
        {
            -100
        } else {
            0
        }
    })
}

// ---------------------------------------------------------------------------
// Four and five candle patterns
// ---------------------------------------------------------------------------

pub fn cdl3blackcrows(c: &Candles) -> Vec<f64> {
    scan(c, 4, |c, i| {
        let (white, first, second) = (i - 3, i - 2, i - 1);
        let crows = [first, second, i];
        if c.white(white)
            && crows.iter().all(|&k| c.black(k))
            && crows
                .iter()
                .all(|&k| c.lower_shadow(k) < c.avg(SHADOW_VERY_SHORT, k))
            && c.open[second] < c.open[first]
            && c.open[second] > c.close[first]
            && c.open[i] < c.open[second]
            && c.open[i] > c.close[second]
            && c.high[white] > c.close[first]
            && c.close[first] > c.close[second]
            && c.close[second] > c.close[i]
        {
            -100
        } else {
            0
        }
    })
}

pub fn cdl3linestrike(c: &Candles) -> Vec<f64> {
    scan(c, 4, |c, i| {
        let (first, second, third) = (i - 3, i - 2, i - 1);
        let color = c.color(third);
        let opens_near = |k: usize, prev: usize| {
            let near = c.avg(NEAR, prev);
            c.open[k] >= c.bottom(prev) - near && c.open[k] <= c.top(prev) + near
        };
        if !(c.color(first) == color
            && c.color(second) == color
            && c.color(i) == -color
            && opens_near(second, first)
            && opens_near(third, second))
        {
            return 0;
        }
        let advancing = if color == 1 {
            c.close[second] > c.close[first]
                && c.close[third] > c.close[second]
                && c.open[i] > c.close[third]
                && c.close[i] < c.open[first]
        } else {
            c.close[second] < c.close[first]
                && c.close[third] < c.close[second]
                && c.open[i] < c.close[third]
                && c.close[i] > c.open[first]
        };
        if advancing {
            color * 100
        } else {
            0
        }
    })
}

pub fn cdlconcealbabyswall(c: &Candles) -> Vec<f64> {
    scan(c, 4, |c, i| {
        let (first, second, third) = (i - 3, i - 2, i - 1);
        let shaven = |k: usize| {
            let svs = c.avg(SHADOW_VERY_SHORT, k);
            c.upper_shadow(k) < svs && c.lower_shadow(k) < svs
        };
        if [first, second, third, i].iter().all(|&k| c.black(k))
            && shaven(first)
            && shaven(second)
            && c.body_gap_down(third, second)
            && c.upper_shadow(third) > c.avg(SHADOW_VERY_SHORT, third)
            && c.high[third] > c.close[second]
            && c.high[i] > c.high[third]
            && c.low[i] < c.low[third]
        {
            100
        } else {
            0
        }
    })
}

pub fn cdlbreakaway(c: &Candles) -> Vec<f64> {
    scan(c, 5, |c, i| {
        let (first, second, third, fourth) = (i - 4, i - 3, i - 2, i - 1);
        if !(c.is_long(first)
            && c.color(first) == c.color(second)
            && c.color(second) == c.color(fourth)
            && c.color(fourth) == -c.color(i))
        {
            return 0;
        }
        let bullish = c.black(first)
            && c.body_gap_down(second, first)
            && c.high[third] < c.high[second]
            && c.low[third] < c.low[second]
            && c.high[fourth] < c.high[third]
            && c.low[fourth] < c.low[third]
            && c.close[i] > c.open[second]
            && c.close[i] < c.close[first];
        let bearish = c.white(first)
            && c.body_gap_up(second, first)
            && c.high[third] > c.high[second]
            && c.low[third] > c.low[second]
            && c.high[fourth] > c.high[third]
            && c.low[fourth] > c.low[third]
            && c.close[i] < c.open[second]
            && c.close[i] > c.close[first];
        if bullish || bearish {
            c.color(i) * 100
        } else {
            0
        }
    })
}

pub fn cdlladderbottom(c: &Candles) -> Vec<f64> {
    scan(c, 5, |c, i| {
        let (first, second, third, fourth) = (i - 4, i - 3, i - 2, i - 1);
        if c.black(first)
            && c.black(second)
            && c.black(third)
            && c.open[first] > c.open[second]
            && c.open[second] > c.open[third]
            && c.close[first] > c.close[second]
            && c.close[second] > c.close[third]
            && c.black(fourth)
            && c.upper_shadow(fourth) > c.avg(SHADOW_VERY_SHORT, fourth)
            && c.white(i)
            && c.open[i] > c.open[fourth]
            && c.close[i] > c.high[fourth]
        {
            100
        } else {
            0
        }
    })
}

pub fn cdlmathold(c: &Candles) -> Vec<f64> {
    scan(c, 5, |c, i| {
        let (first, second, third, fourth) = (i - 4, i - 3, i - 2, i - 1);
        let floor = c.close[first] - c.body(first) * MAT_HOLD_PENETRATION;
        if c.is_long(first)
            && c.is_short(second)
            && c.is_short(third)
            && c.is_short(fourth)
            && c.white(first)
            && c.black(second)
            && c.white(i)
            && c.body_gap_up(second, first)
            && c.bottom(third) < c.close[first]
            && c.bottom(fourth) < c.close[first]
            && c.bottom(third) > floor
            && c.bottom(fourth) > floor
            && c.top(third) < c.open[second]
            && c.top(fourth) < c.top(third)
            && c.open[i] > c.close[fourth]
            && c.close[i] > c.high[second].max(c.high[third]).max(c.high[fourth])
        {
            100
        } else {
            0
        }
    })
}

pub fn cdlrisefall3methods(c: &Candles) -> Vec<f64> {
    scan(c, 5, |c, i| {
        let (first, second, third, fourth) = (i - 4, i - 3, i - 2, i - 1);
        let color = c.color(first);
        let dir = color as f64;
        let reaction = [second, third, fourth];
        if c.is_long(first)
            && reaction.iter().all(|&k| c.is_short(k))
            && c.is_long(i)
            && reaction.iter().all(|&k| c.color(k) == -color)
            && c.color(i) == color
            && reaction
                .iter()
                .all(|&k| c.bottom(k) < c.high[first] && c.top(k) > c.low[first])
            && c.close[third] * dir < c.close[second] * dir
            && c.close[fourth] * dir < c.close[third] * dir
            && c.open[i] * dir > c.close[fourth] * dir
            && c.close[i] * dir > c.close[first] * dir
        {
            color * 100
        } else {
            0
        }
    })
}
