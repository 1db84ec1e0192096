#[cfg(test)]
mod common;


#[cfg(test)]
mod role_tests;



#[cfg(test)]
mod membership_tests;
