use aerogp_doe::{FullFactorial, Lhs, LhsKind, SamplingMethod};
use ndarray::arr2;

fn main() {
    let xlimits = arr2(&[[0., 1.], [-10., 10.], [5., 15.]]);
    let n = 10;

    println!("Take {n} samples in");
    println!("{xlimits}\n");

    println!("*** using balanced full-factorial sampling");
    let samples = FullFactorial::new(&xlimits).sample(n);
    println!("{samples}\n");

    println!("*** using a 2-levels full-factorial grid");
    let samples = FullFactorial::new(&xlimits).levels(2).sample_grid();
    println!("{samples}\n");

    println!("*** using centered latin hypercube sampling");
    let samples = Lhs::new(&xlimits).kind(LhsKind::Centered).sample(n);
    println!("{samples}\n");

    println!("*** using maximin latin hypercube sampling");
    let samples = Lhs::new(&xlimits).sample(n);
    println!("{samples}\n");
}
