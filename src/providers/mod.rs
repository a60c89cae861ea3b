/*!
Bundled providers.

Providers live outside the registry core: they only declare services through
property strings and supply the factories behind the class names.
*/

pub mod pqc;
