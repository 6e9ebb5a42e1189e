macro_rules! zip_eq {
    ($a:expr $(,)*) => {
        $a.into_iter().map(|a| (a,))
    };
    ($a:expr, $b:expr $(,)*) => {
        crate::shared::util::zip_eq($a, $b)
    };
    ($a:expr, $b:expr, $c:expr $(,)*) => {
        crate::shared::util::zip_eq(crate::shared::util::zip_eq($a, $b), $c)
            .map(|((a, b), c)| (a, b, c))
    };
}

pub(crate) fn zip_eq<As, Bs>(a: As, b: Bs) -> ::std::iter::Zip<As::IntoIter, Bs::IntoIter>
where
    As: IntoIterator, As::IntoIter: ExactSizeIterator,
    Bs: IntoIterator, Bs::IntoIter: ExactSizeIterator,
{
    let (a, b) = (a.into_iter(), b.into_iter());
    assert_eq!(a.len(), b.len());
    a.zip(b)
}
