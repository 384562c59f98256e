//! 自适应线性预测的逆过程.
//!
//! 残差经 FIR 预测还原为样本, 系数在还原过程中按残差符号逐样本调整.
//! 4 阶与 8 阶走常量泛型特化路径, 系数在整块内以 i32 累加, 块末写回 i16;
//! 其他阶数走通用路径, 每次调整即按 i16 回绕. 所有算术为 32 位有符号回绕.

/// 一阶差分哨兵阶数
pub(crate) const FIRST_ORDER: u32 = 31;

/// 取符号: 正数 1, 负数 -1, 零 0
#[inline]
fn sign_of(v: i32) -> i32 {
    ((v.wrapping_neg() as u32) >> 31) as i32 | (v >> 31)
}

/// 截断到声道位宽并符号扩展
#[inline]
fn truncate(v: i32, chan_shift: u32) -> i32 {
    match chan_shift {
        0 => v,
        s if s < 32 => (v << s) >> s,
        _ => 0,
    }
}

#[inline]
fn chan_shift_of(chan_bits: u32) -> u32 {
    32u32.saturating_sub(chan_bits)
}

/// 原地一阶差分还原 (阶数 31 的预处理)
pub(crate) fn delta_in_place(buf: &mut [i32], chan_bits: u32) {
    let shift = chan_shift_of(chan_bits);
    let Some((first, rest)) = buf.split_first_mut() else {
        return;
    };
    let mut prev = *first;
    for v in rest {
        prev = truncate(v.wrapping_add(prev), shift);
        *v = prev;
    }
}

/// 由残差 `input` 还原样本写入 `output`
///
/// 只处理前 `num` 个样本; `coefs` 至少有 `num_active` 个元素, 调整后的值写回.
pub(crate) fn unpc_block(
    input: &[i32],
    output: &mut [i32],
    num: usize,
    coefs: &mut [i16],
    num_active: u32,
    chan_bits: u32,
    den_shift: u32,
) {
    if num == 0 {
        return;
    }
    let input = &input[..num];
    let output = &mut output[..num];
    let shift = chan_shift_of(chan_bits);

    output[0] = input[0];

    if num_active == 0 {
        output.copy_from_slice(input);
        return;
    }

    if num_active == FIRST_ORDER {
        let mut prev = output[0];
        for (out, &inp) in output.iter_mut().zip(input).skip(1) {
            prev = truncate(inp.wrapping_add(prev), shift);
            *out = prev;
        }
        return;
    }

    let na = num_active as usize;
    // 热身: 样本不足 na+1 个时用链式差分
    for j in 1..=na.min(num - 1) {
        output[j] = truncate(input[j].wrapping_add(output[j - 1]), shift);
    }

    let den_half = if den_shift > 0 {
        1i32 << (den_shift - 1)
    } else {
        0
    };
    let p = Params {
        shift,
        den_shift,
        den_half,
    };

    match na {
        4 => unpc_fixed::<4>(input, output, coefs, p),
        8 => unpc_fixed::<8>(input, output, coefs, p),
        _ => unpc_general(input, output, &mut coefs[..na], p),
    }
}

#[derive(Clone, Copy)]
struct Params {
    shift: u32,
    den_shift: u32,
    den_half: i32,
}

fn unpc_fixed<const N: usize>(input: &[i32], output: &mut [i32], coefs: &mut [i16], p: Params) {
    let mut a = [0i32; N];
    for (acc, &c) in a.iter_mut().zip(coefs.iter()) {
        *acc = i32::from(c);
    }

    for j in (N + 1)..input.len() {
        let top = output[j - N - 1];
        let mut b = [0i32; N];
        for (i, bi) in b.iter_mut().enumerate() {
            *bi = top.wrapping_sub(output[j - 1 - i]);
        }

        let mut acc = p.den_half;
        for i in 0..N {
            acc = acc.wrapping_sub(a[i].wrapping_mul(b[i]));
        }
        let sum1 = acc >> p.den_shift;

        let del = input[j];
        let mut del0 = del;
        let sg = sign_of(del);
        output[j] = truncate(del.wrapping_add(top).wrapping_add(sum1), p.shift);

        if sg > 0 {
            let mut done = false;
            for i in (1..N).rev() {
                let sgn = sign_of(b[i]);
                a[i] -= sgn;
                let rank = (N - i) as i32;
                del0 = del0.wrapping_sub(rank.wrapping_mul(sgn.wrapping_mul(b[i]) >> p.den_shift));
                if del0 <= 0 {
                    done = true;
                    break;
                }
            }
            if !done {
                a[0] -= sign_of(b[0]);
            }
        } else if sg < 0 {
            let mut done = false;
            for i in (1..N).rev() {
                let sgn = -sign_of(b[i]);
                a[i] -= sgn;
                let rank = (N - i) as i32;
                del0 = del0.wrapping_sub(rank.wrapping_mul(sgn.wrapping_mul(b[i]) >> p.den_shift));
                if del0 >= 0 {
                    done = true;
                    break;
                }
            }
            if !done {
                a[0] += sign_of(b[0]);
            }
        }
    }

    for (c, &acc) in coefs.iter_mut().zip(a.iter()) {
        *c = acc as i16;
    }
}

fn unpc_general(input: &[i32], output: &mut [i32], coefs: &mut [i16], p: Params) {
    let na = coefs.len();
    for j in (na + 1)..input.len() {
        let top = output[j - na - 1];

        let mut sum1 = 0i32;
        for (k, &c) in coefs.iter().enumerate() {
            sum1 = sum1.wrapping_add(i32::from(c).wrapping_mul(output[j - 1 - k].wrapping_sub(top)));
        }

        let del = input[j];
        let mut del0 = del;
        let sg = sign_of(del);
        let pred = sum1.wrapping_add(p.den_half) >> p.den_shift;
        output[j] = truncate(del.wrapping_add(top).wrapping_add(pred), p.shift);

        if sg > 0 {
            for k in (0..na).rev() {
                let dd = top.wrapping_sub(output[j - 1 - k]);
                let sgn = sign_of(dd);
                coefs[k] = coefs[k].wrapping_sub(sgn as i16);
                let rank = (na - k) as i32;
                del0 = del0.wrapping_sub(rank.wrapping_mul(sgn.wrapping_mul(dd) >> p.den_shift));
                if del0 <= 0 {
                    break;
                }
            }
        } else if sg < 0 {
            for k in (0..na).rev() {
                let dd = top.wrapping_sub(output[j - 1 - k]);
                let sgn = sign_of(dd);
                coefs[k] = coefs[k].wrapping_add(sgn as i16);
                let rank = (na - k) as i32;
                del0 =
                    del0.wrapping_sub(rank.wrapping_mul((-sgn).wrapping_mul(dd) >> p.den_shift));
                if del0 >= 0 {
                    break;
                }
            }
        }
    }
}
